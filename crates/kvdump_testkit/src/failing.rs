//! A storage backend that fails on demand.
//!
//! Wraps another backend and lets a fixed number of appends through; after
//! that every append fails, optionally writing part of its bytes first the
//! way an interrupted write would.

use kvdump_storage::{StorageBackend, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// How appends fail once the allowance is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Nothing is written.
    Clean,
    /// The first half of the bytes is written before the error.
    Torn,
}

/// Observes a [`FailingBackend`] after it has been handed to an environment.
#[derive(Debug, Clone, Default)]
pub struct FailureProbe {
    failures: Arc<AtomicUsize>,
    tripped: Arc<AtomicBool>,
}

impl FailureProbe {
    /// Returns `true` once an append has failed.
    pub fn tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Number of failed appends.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

/// A backend wrapper whose appends start failing after `allowed` successes.
pub struct FailingBackend {
    inner: Box<dyn StorageBackend>,
    remaining: usize,
    mode: FailureMode,
    probe: FailureProbe,
}

impl FailingBackend {
    /// Lets `allowed` appends through, then fails cleanly.
    pub fn fail_after(inner: Box<dyn StorageBackend>, allowed: usize) -> Self {
        Self::new(inner, allowed, FailureMode::Clean)
    }

    /// Lets `allowed` appends through, then tears each later append.
    pub fn torn_after(inner: Box<dyn StorageBackend>, allowed: usize) -> Self {
        Self::new(inner, allowed, FailureMode::Torn)
    }

    fn new(inner: Box<dyn StorageBackend>, allowed: usize, mode: FailureMode) -> Self {
        Self {
            inner,
            remaining: allowed,
            mode,
            probe: FailureProbe::default(),
        }
    }

    /// A handle that stays usable after the backend is boxed away.
    pub fn probe(&self) -> FailureProbe {
        self.probe.clone()
    }
}

impl StorageBackend for FailingBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_at(offset, len)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if self.remaining > 0 {
            self.remaining -= 1;
            return self.inner.append(data);
        }

        self.probe.tripped.store(true, Ordering::SeqCst);
        self.probe.failures.fetch_add(1, Ordering::SeqCst);
        if self.mode == FailureMode::Torn && data.len() > 1 {
            self.inner.append(&data[..data.len() / 2])?;
        }
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "simulated append failure",
        )))
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.flush()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.sync()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        self.inner.truncate(new_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvdump_storage::InMemoryBackend;

    #[test]
    fn fails_after_allowance() {
        let memory = InMemoryBackend::new();
        let mut backend = FailingBackend::fail_after(Box::new(memory.clone()), 1);
        let probe = backend.probe();

        backend.append(b"one").unwrap();
        assert!(backend.append(b"two").is_err());
        assert!(probe.tripped());
        assert_eq!(probe.failures(), 1);
        assert_eq!(memory.data(), b"one".to_vec());
    }

    #[test]
    fn torn_append_leaves_partial_bytes() {
        let memory = InMemoryBackend::new();
        let mut backend = FailingBackend::torn_after(Box::new(memory.clone()), 0);

        assert!(backend.append(b"abcd").is_err());
        assert_eq!(memory.data(), b"ab".to_vec());
    }
}
