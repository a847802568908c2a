//! Errors reported by `kvload`.

use kvdump_load::LoadError;
use kvdump_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Anything that makes a `kvload` run fail.
#[derive(Debug, Error)]
pub enum CliError {
    /// The input file could not be opened.
    #[error("{}: {source}", .path.display())]
    Input {
        /// File given with `-f`.
        path: PathBuf,
        /// Why it could not be opened.
        source: std::io::Error,
    },

    /// The environment could not be opened or closed.
    #[error("{}: {source}", .path.display())]
    Environment {
        /// Environment path.
        path: PathBuf,
        /// The store failure.
        source: StoreError,
    },

    /// The load itself failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The summary could not be written.
    #[error("writing summary: {0}")]
    Output(#[from] serde_json::Error),
}
