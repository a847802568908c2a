//! Mutable state of one load run.

use crate::codec::FormatMode;
use crate::config::LoadOptions;
use crate::error::{FormatError, LoadError};
use crate::header::HeaderBlock;
use kvdump_store::{DatabaseFlags, StoreError};

/// Everything the decoder and loader track between calls.
///
/// One session lives for one run. The header parser replaces the section
/// fields at each header; the line decoder advances `line` and sets `eof`.
#[derive(Debug, Clone)]
pub struct LoaderSession {
    /// Lines consumed so far; the line being read is `line` once counted.
    pub line: u64,
    /// Encoding of the current section's payloads.
    pub format: FormatMode,
    /// Whether headers and per-line framing are in effect.
    pub framing: bool,
    /// Target sub-database of the current section.
    pub database: Option<String>,
    /// Creation flags of the current section.
    pub flags: DatabaseFlags,
    /// Set once the input has run out.
    pub eof: bool,
}

impl LoaderSession {
    /// Starts a session for a run with `options`.
    #[must_use]
    pub fn new(options: &LoadOptions) -> Self {
        Self {
            line: 0,
            format: FormatMode::HexPairs,
            framing: !options.raw,
            database: options.database.clone(),
            flags: DatabaseFlags::empty(),
            eof: false,
        }
    }

    /// Counts the start of a new input line.
    pub fn begin_line(&mut self) {
        self.line += 1;
    }

    /// Adopts a parsed header as the current section.
    pub fn apply_header(&mut self, block: &HeaderBlock) {
        self.format = block.format;
        self.database.clone_from(&block.database);
        self.flags = block.flags;
    }

    /// Tags a format violation with the current line.
    #[must_use]
    pub fn format_error(&self, source: FormatError) -> LoadError {
        LoadError::format(self.line, source)
    }

    /// Tags a store failure with the current line.
    #[must_use]
    pub fn store_error(&self, source: StoreError) -> LoadError {
        LoadError::store(self.line, source)
    }
}
