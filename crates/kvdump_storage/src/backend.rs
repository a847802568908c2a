//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};
use std::ops::Range;

/// An append-only byte store holding an environment's commit log.
///
/// # Invariants
///
/// - `append` returns the offset where the bytes were written
/// - `read_at` returns exactly the bytes previously appended at that offset
/// - after `sync` returns, every appended byte survives process termination
/// - `truncate` only ever shrinks; it is used to drop a torn commit tail
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::StorageError::ReadPastEnd`] when the range is not
    /// fully stored, or with an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` and returns the offset it was written at.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the number of stored bytes, which is also the next append offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Forces data and metadata to durable media.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Shrinks the storage to `new_size` bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::StorageError::InvalidTruncate`] if `new_size`
    /// exceeds the current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Reads every stored byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined or the read fails.
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        let len = usize::try_from(size).map_err(|_| {
            crate::StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::OutOfMemory,
                "storage larger than the address space",
            ))
        })?;
        self.read_at(0, len)
    }
}

/// Validates that `len` bytes at `offset` lie within `size` stored bytes,
/// returning them as an index range.
pub(crate) fn check_range(offset: u64, len: usize, size: u64) -> StorageResult<Range<usize>> {
    let past_end = || StorageError::ReadPastEnd { offset, len, size };
    match offset.checked_add(len as u64) {
        Some(end) if end <= size => {}
        _ => return Err(past_end()),
    }
    let start = usize::try_from(offset).map_err(|_| past_end())?;
    Ok(start..start + len)
}
