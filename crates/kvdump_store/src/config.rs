//! Environment configuration.

/// Default maximum key size in bytes.
pub const DEFAULT_MAX_KEY_SIZE: usize = 511;

/// Configuration for opening an environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Treat the path as the data file itself rather than a directory.
    pub no_subdir: bool,

    /// Whether to create the environment if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to sync the commit log on every commit (safer but slower).
    pub sync_on_commit: bool,

    /// Largest key accepted by `Cursor::put`.
    pub max_key_size: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            no_subdir: false,
            create_if_missing: true,
            sync_on_commit: true,
            max_key_size: DEFAULT_MAX_KEY_SIZE,
        }
    }
}

impl EnvConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the path names the data file directly.
    #[must_use]
    pub const fn no_subdir(mut self, value: bool) -> Self {
        self.no_subdir = value;
        self
    }

    /// Sets whether to create the environment if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync the log on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets the maximum key size.
    #[must_use]
    pub const fn max_key_size(mut self, size: usize) -> Self {
        self.max_key_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EnvConfig::default();
        assert!(!config.no_subdir);
        assert!(config.create_if_missing);
        assert!(config.sync_on_commit);
        assert_eq!(config.max_key_size, 511);
    }

    #[test]
    fn builder_pattern() {
        let config = EnvConfig::new()
            .no_subdir(true)
            .sync_on_commit(false)
            .max_key_size(64);

        assert!(config.no_subdir);
        assert!(!config.sync_on_commit);
        assert_eq!(config.max_key_size, 64);
    }
}
