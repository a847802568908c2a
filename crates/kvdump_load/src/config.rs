//! Loader configuration.

/// Records applied per transaction before the loader commits.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Options controlling one load run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Records applied per transaction before a commit.
    pub batch_size: usize,
    /// Skip records whose key already exists instead of overwriting.
    pub no_overwrite: bool,
    /// Input has no headers and no per-line framing; payloads are hex pairs.
    pub raw: bool,
    /// Sub-database for the first section; `None` is the default database.
    pub database: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            no_overwrite: false,
            raw: false,
            database: None,
        }
    }
}

impl LoadOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size.
    #[must_use]
    pub const fn batch_size(mut self, records: usize) -> Self {
        self.batch_size = records;
        self
    }

    /// Enables or disables duplicate-key skipping.
    #[must_use]
    pub const fn no_overwrite(mut self, enabled: bool) -> Self {
        self.no_overwrite = enabled;
        self
    }

    /// Enables or disables raw mode.
    #[must_use]
    pub const fn raw(mut self, enabled: bool) -> Self {
        self.raw = enabled;
        self
    }

    /// Targets a named sub-database.
    #[must_use]
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = LoadOptions::default();
        assert_eq!(options.batch_size, 100);
        assert!(!options.no_overwrite);
        assert!(!options.raw);
        assert!(options.database.is_none());
    }

    #[test]
    fn builder_chain() {
        let options = LoadOptions::new()
            .batch_size(10)
            .no_overwrite(true)
            .raw(true)
            .database("users");
        assert_eq!(options.batch_size, 10);
        assert!(options.no_overwrite);
        assert!(options.raw);
        assert_eq!(options.database.as_deref(), Some("users"));
    }
}
