//! # kvdump storage
//!
//! Byte storage backends underneath the kvdump store.
//!
//! A backend is an **opaque append-only byte store**: the store above it
//! writes framed commit records and replays them on open. Backends never
//! interpret what they hold.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - ephemeral environments and tests
//! - [`FileBackend`] - the `data.kvd` file of an on-disk environment
//!
//! ## Example
//!
//! ```rust
//! use kvdump_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"commit").unwrap();
//! assert_eq!(backend.read_at(offset, 6).unwrap(), b"commit");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
