//! # kvdump testkit
//!
//! Test utilities for kvdump.
//!
//! This crate provides:
//! - [`DumpBuilder`] and the payload encoders, for writing dump input
//! - Property-based generators using proptest
//! - [`TestEnv`] fixtures over memory or a temporary directory
//! - [`FailingBackend`], a storage wrapper that fails commits on demand
//!
//! ## Usage
//!
//! ```rust
//! use kvdump_testkit::prelude::*;
//!
//! let dump = DumpBuilder::new()
//!     .section(Section::new(Encoding::Print).pair(b"k", b"v"))
//!     .build();
//! assert!(dump.ends_with(b"DATA=END\n"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod dump;
pub mod failing;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dump::*;
    pub use crate::failing::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use dump::*;
pub use failing::*;
pub use fixtures::*;
pub use generators::*;
