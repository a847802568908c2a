//! # kvdump store
//!
//! A transactional key-value store with named sub-databases: the target
//! the kvdump loader writes into.
//!
//! This crate provides:
//! - [`Environment`]: one commit log plus a lock, holding the default
//!   database and any number of named sub-databases
//! - [`WriteTxn`] / [`ReadTxn`]: a single writer and snapshot readers
//! - [`Cursor`]: ordered insertion with duplicate-key signaling
//!
//! ## Example
//!
//! ```rust
//! use kvdump_storage::InMemoryBackend;
//! use kvdump_store::{DatabaseFlags, EnvConfig, Environment, PutFlags};
//!
//! let env = Environment::with_backend(Box::new(InMemoryBackend::new()), EnvConfig::new()).unwrap();
//! let mut txn = env.begin_write().unwrap();
//! let dbi = txn.open_database(Some("users"), DatabaseFlags::empty()).unwrap();
//! txn.cursor(dbi).unwrap().put(b"alice", b"1", PutFlags::NO_OVERWRITE).unwrap();
//! txn.commit().unwrap();
//!
//! let read = env.begin_read();
//! assert_eq!(read.get(dbi, b"alice").unwrap(), Some(&b"1"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod cursor;
mod env;
mod error;
mod log;
mod order;
mod txn;
mod types;

pub use config::{EnvConfig, DEFAULT_MAX_KEY_SIZE};
pub use cursor::Cursor;
pub use env::{Environment, DATA_FILE, LOCK_FILE};
pub use error::{StoreError, StoreResult};
pub use log::{LOG_MAGIC, LOG_VERSION};
pub use txn::{ReadTxn, TransactionState, WriteTxn};
pub use types::{DatabaseFlags, Dbi, PutFlags, TransactionId};
