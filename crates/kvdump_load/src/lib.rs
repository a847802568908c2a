//! # kvdump_load
//!
//! Reads the line-oriented dump format and replays it into a kvdump
//! environment.
//!
//! A dump is one or more sections. Each section is a header block of
//! `keyword=value` lines closed by `HEADER=END`, followed by key and value
//! lines that each start with a single space, closed by `DATA=END` or the
//! end of input:
//!
//! ```text
//! VERSION=3
//! format=print
//! database=users
//! type=btree
//! HEADER=END
//!  alice
//!  {"age":\33\30}
//! DATA=END
//! ```
//!
//! Payloads are either escaped text (`format=print`) or hex pairs
//! (`format=bytevalue`). Lines are decoded in place inside reusable
//! [`GrowableBuffer`]s and written through a store cursor in batches of
//! [`LoadOptions::batch_size`] records, each batch its own transaction.
//!
//! ## Quick Start
//!
//! ```rust
//! use kvdump_load::{load, LoadOptions};
//! use kvdump_store::{EnvConfig, Environment};
//! use kvdump_storage::InMemoryBackend;
//!
//! let env = Environment::with_backend(Box::new(InMemoryBackend::new()), EnvConfig::new()).unwrap();
//! let dump = b"format=print\nHEADER=END\n key\n value\nDATA=END\n";
//! let stats = load(&env, &dump[..], LoadOptions::new()).unwrap();
//! assert_eq!(stats.records, 1);
//!
//! let read = env.begin_read();
//! let main = read.open_database(None).unwrap();
//! assert_eq!(read.get(main, b"key").unwrap(), Some(&b"value"[..]));
//! ```

mod buffer;
mod codec;
mod config;
mod error;
mod header;
mod line;
mod loader;
mod session;

pub use buffer::{GrowableBuffer, LineRead};
pub use codec::{hex_value, unescape_in_place, unhex_in_place, FormatMode};
pub use config::{LoadOptions, DEFAULT_BATCH_SIZE};
pub use error::{FormatError, LoadError, LoadResult, ReadError};
pub use header::{apply_header_line, parse_header, HeaderBlock, HeaderLine, HEADER_END, MAX_VERSION};
pub use line::{Decoded, LineDecoder};
pub use loader::{load, BatchLoader, LoadStats, VALUE_BUFFER_SIZE};
pub use session::LoaderSession;
