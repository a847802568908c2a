//! The environment: one commit log shared by every database it holds.

use crate::catalog::Catalog;
use crate::config::EnvConfig;
use crate::error::{StoreError, StoreResult};
use crate::log::CommitLog;
use crate::txn::{ReadTxn, WriteTxn};
use crate::types::{Dbi, TransactionId};
use fs2::FileExt;
use kvdump_storage::{FileBackend, StorageBackend, StorageError};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Name of the data file inside an environment directory.
pub const DATA_FILE: &str = "data.kvd";

/// Name of the lock file inside an environment directory.
pub const LOCK_FILE: &str = "lock.kvd";

/// A storage environment holding the default database and any number of
/// named sub-databases.
///
/// ## Single-Writer Guarantee
///
/// [`Environment::begin_write`] takes an exclusive lock held for the
/// transaction's lifetime, so exactly one write transaction is open at a
/// time. A [`ReadTxn`] holds the committed state for reading; a commit
/// waits for open readers before publishing.
pub struct Environment {
    config: EnvConfig,
    path: Option<PathBuf>,
    pub(crate) log: Mutex<CommitLog>,
    pub(crate) catalog: RwLock<Catalog>,
    open_handles: RwLock<HashSet<u32>>,
    next_txid: AtomicU64,
    write_lock: Mutex<()>,
    lock_file: Option<File>,
}

impl Environment {
    /// Opens (or creates) an on-disk environment.
    ///
    /// With `no_subdir` unset, `path` is a directory holding
    /// [`DATA_FILE`] and [`LOCK_FILE`]. With `no_subdir` set, `path` is
    /// the data file and the lock file is `<path>-lock`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EnvironmentLocked`] if another handle holds the lock
    /// - [`StoreError::Storage`] if the data file is missing and
    ///   `create_if_missing` is unset, or cannot be read
    /// - [`StoreError::LogCorruption`] if the commit log is damaged
    pub fn open(path: &Path, config: EnvConfig) -> StoreResult<Self> {
        let (data_path, lock_path) = if config.no_subdir {
            let mut lock = path.as_os_str().to_owned();
            lock.push("-lock");
            (path.to_path_buf(), PathBuf::from(lock))
        } else {
            if config.create_if_missing {
                fs::create_dir_all(path)?;
            } else if !path.is_dir() {
                return Err(StorageError::NotFound(path.display().to_string()).into());
            }
            (path.join(DATA_FILE), path.join(LOCK_FILE))
        };

        let backend = FileBackend::open(&data_path, config.create_if_missing)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        FileExt::try_lock_exclusive(&lock_file).map_err(|err| {
            if err.kind() == fs2::lock_contended_error().kind() {
                StoreError::EnvironmentLocked
            } else {
                StoreError::Io(err)
            }
        })?;

        let mut env = Self::with_backend(Box::new(backend), config)?;
        env.path = Some(path.to_path_buf());
        env.lock_file = Some(lock_file);

        info!(path = %path.display(), "opened environment");
        Ok(env)
    }

    /// Builds an environment over an arbitrary backend, replaying whatever
    /// commit records it already holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing log cannot be replayed.
    pub fn with_backend(backend: Box<dyn StorageBackend>, config: EnvConfig) -> StoreResult<Self> {
        let mut log = CommitLog::new(backend, config.sync_on_commit);
        let records = log.replay()?;

        let mut catalog = Catalog::default();
        for record in &records {
            catalog.apply_record(record)?;
        }
        debug!(records = records.len(), "replayed commit log");

        let next_txid = catalog.last_txid() + 1;
        Ok(Self {
            config,
            path: None,
            log: Mutex::new(log),
            catalog: RwLock::new(catalog),
            open_handles: RwLock::new(HashSet::new()),
            next_txid: AtomicU64::new(next_txid),
            write_lock: Mutex::new(()),
            lock_file: None,
        })
    }

    /// Begins the single write transaction, blocking while another is open.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible for parity with `commit`.
    pub fn begin_write(&self) -> StoreResult<WriteTxn<'_>> {
        let guard = self.write_lock.lock();
        let id = TransactionId::new(self.next_txid.fetch_add(1, Ordering::SeqCst));
        Ok(WriteTxn::new(self, id, guard))
    }

    /// Begins a read transaction over the committed state.
    #[must_use]
    pub fn begin_read(&self) -> ReadTxn<'_> {
        ReadTxn::new(self.catalog.read())
    }

    /// Releases a database handle. Later cursors on it fail.
    pub fn close_database(&self, dbi: Dbi) {
        self.open_handles.write().remove(&dbi.0);
    }

    /// Flushes the commit log and releases the environment lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the final sync or unlock fails.
    pub fn close(self) -> StoreResult<()> {
        self.log.lock().sync()?;
        if let Some(lock_file) = &self.lock_file {
            FileExt::unlock(lock_file)?;
        }
        info!("closed environment");
        Ok(())
    }

    /// Largest key accepted by a put.
    #[must_use]
    pub fn max_key_size(&self) -> usize {
        self.config.max_key_size
    }

    /// Path the environment was opened at, if on disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn register_handle(&self, id: u32) {
        self.open_handles.write().insert(id);
    }

    pub(crate) fn is_open(&self, id: u32) -> bool {
        self.open_handles.read().contains(&id)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DatabaseFlags, PutFlags};
    use kvdump_storage::InMemoryBackend;
    use tempfile::tempdir;

    fn put_one(env: &Environment, name: Option<&str>, key: &[u8], value: &[u8]) {
        let mut txn = env.begin_write().unwrap();
        let dbi = txn.open_database(name, DatabaseFlags::empty()).unwrap();
        txn.cursor(dbi)
            .unwrap()
            .put(key, value, PutFlags::empty())
            .unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn reopen_replays_commits() {
        let backend = InMemoryBackend::new();
        {
            let env = Environment::with_backend(Box::new(backend.clone()), EnvConfig::new()).unwrap();
            put_one(&env, Some("a"), b"k1", b"v1");
            put_one(&env, None, b"k2", b"v2");
        }

        let env = Environment::with_backend(Box::new(backend), EnvConfig::new()).unwrap();
        let read = env.begin_read();
        let a = read.open_database(Some("a")).unwrap();
        let main = read.open_database(None).unwrap();
        assert_eq!(read.get(a, b"k1").unwrap(), Some(&b"v1"[..]));
        assert_eq!(read.get(main, b"k2").unwrap(), Some(&b"v2"[..]));
    }

    #[test]
    fn transaction_ids_continue_after_reopen() {
        let backend = InMemoryBackend::new();
        {
            let env = Environment::with_backend(Box::new(backend.clone()), EnvConfig::new()).unwrap();
            put_one(&env, None, b"k", b"v");
            put_one(&env, None, b"k", b"w");
        }
        let env = Environment::with_backend(Box::new(backend), EnvConfig::new()).unwrap();
        let txn = env.begin_write().unwrap();
        assert_eq!(txn.id(), TransactionId::new(3));
    }

    #[test]
    fn open_directory_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("env");

        let env = Environment::open(&path, EnvConfig::new()).unwrap();
        put_one(&env, None, b"k", b"v");
        env.close().unwrap();

        assert!(path.join(DATA_FILE).exists());
        assert!(path.join(LOCK_FILE).exists());

        let env = Environment::open(&path, EnvConfig::new().create_if_missing(false)).unwrap();
        let read = env.begin_read();
        let main = read.open_database(None).unwrap();
        assert_eq!(read.len(main).unwrap(), 1);
    }

    #[test]
    fn open_no_subdir_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flat.kvd");

        let env = Environment::open(&path, EnvConfig::new().no_subdir(true)).unwrap();
        put_one(&env, None, b"k", b"v");
        env.close().unwrap();

        assert!(path.is_file());
        assert!(dir.path().join("flat.kvd-lock").exists());
    }

    #[test]
    fn open_missing_without_create_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent");

        let result = Environment::open(&path, EnvConfig::new().create_if_missing(false));
        assert!(matches!(result, Err(StoreError::Storage(_))));
    }

    #[test]
    fn second_open_is_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("env");

        let _env = Environment::open(&path, EnvConfig::new()).unwrap();
        let second = Environment::open(&path, EnvConfig::new());
        assert!(matches!(second, Err(StoreError::EnvironmentLocked)));
    }
}
