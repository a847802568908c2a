//! Test environments with automatic cleanup.

use kvdump_storage::InMemoryBackend;
use kvdump_store::{EnvConfig, Environment};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

enum Location {
    Memory(InMemoryBackend),
    Dir { _temp_dir: TempDir, path: PathBuf },
}

/// An environment over memory or a temporary directory.
pub struct TestEnv {
    /// The environment instance.
    pub env: Environment,
    location: Location,
}

impl TestEnv {
    /// Creates an in-memory environment.
    pub fn memory() -> Self {
        let backend = InMemoryBackend::new();
        let env = Environment::with_backend(Box::new(backend.clone()), EnvConfig::new())
            .expect("Failed to open in-memory environment");
        Self {
            env,
            location: Location::Memory(backend),
        }
    }

    /// Creates an on-disk environment in a fresh temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("env");
        let env = Environment::open(&path, EnvConfig::new()).expect("Failed to open environment");
        Self {
            env,
            location: Location::Dir {
                _temp_dir: temp_dir,
                path,
            },
        }
    }

    /// Returns the environment path if on disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::Memory(_) => None,
            Location::Dir { path, .. } => Some(path),
        }
    }

    /// Closes and reopens the environment, replaying its commit log.
    pub fn reopen(self) -> Self {
        let Self { env, location } = self;
        drop(env);
        let env = match &location {
            Location::Memory(backend) => {
                Environment::with_backend(Box::new(backend.clone()), EnvConfig::new())
            }
            Location::Dir { path, .. } => Environment::open(path, EnvConfig::new()),
        }
        .expect("Failed to reopen environment");
        Self { env, location }
    }

    /// Every pair of a database in key order, empty if it does not exist.
    pub fn entries(&self, name: Option<&str>) -> Vec<(Vec<u8>, Vec<u8>)> {
        let read = self.env.begin_read();
        match read.open_database(name) {
            Ok(dbi) => read.entries(dbi).expect("Failed to read entries"),
            Err(_) => Vec::new(),
        }
    }
}

impl std::ops::Deref for TestEnv {
    type Target = Environment;

    fn deref(&self) -> &Self::Target {
        &self.env
    }
}
