//! Growable line scratch buffer.

use crate::error::{FormatError, ReadError};
use std::io::{BufRead, ErrorKind};

/// Smallest capacity a buffer starts with.
const MIN_CAPACITY: usize = 16;

/// Outcome of [`GrowableBuffer::read_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRead {
    /// A newline-terminated line was captured; the newline is stripped.
    Complete,
    /// The input ended before any byte of a new line.
    Eof,
    /// The input ended part-way through a line.
    Truncated,
}

/// An owned byte buffer holding one input line at a time.
///
/// The buffer has a fixed capacity that doubles whenever the current line
/// does not fit, and never shrinks. `len` tracks the bytes of the current
/// line (or, after an in-place decode, of its decoded form).
#[derive(Debug, Clone)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    len: usize,
}

impl GrowableBuffer {
    /// Creates a buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity.max(MIN_CAPACITY)],
            len: 0,
        }
    }

    /// Current capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Length of the current contents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The current contents.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Forgets the current contents, keeping the capacity.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Reads the next line from `reader`, replacing the current contents.
    ///
    /// Capacity doubles each time the line (including its newline) does not
    /// fit, and reading continues into the extension.
    ///
    /// # Errors
    ///
    /// Fails with [`FormatError::BufferExhausted`] if the buffer cannot
    /// grow, or with the reader's I/O error.
    pub fn read_line<R: BufRead>(&mut self, reader: &mut R) -> Result<LineRead, ReadError> {
        self.len = 0;
        loop {
            if self.len == self.data.len() {
                self.grow()?;
            }

            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if available.is_empty() {
                return Ok(if self.len == 0 {
                    LineRead::Eof
                } else {
                    LineRead::Truncated
                });
            }

            let room = self.data.len() - self.len;
            let (take, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) if pos < room => (pos + 1, true),
                _ => (available.len().min(room), false),
            };
            self.data[self.len..self.len + take].copy_from_slice(&available[..take]);
            reader.consume(take);

            if complete {
                self.len += take - 1;
                return Ok(LineRead::Complete);
            }
            self.len += take;
        }
    }

    /// Rewrites the contents in place with `decode`, which returns the new
    /// length.
    ///
    /// # Errors
    ///
    /// Propagates the decoder's failure; the contents are then unspecified.
    pub fn decode_in_place<F>(&mut self, decode: F) -> Result<(), FormatError>
    where
        F: FnOnce(&mut [u8]) -> Result<usize, FormatError>,
    {
        let decoded = decode(&mut self.data[..self.len])?;
        debug_assert!(decoded <= self.len);
        self.len = decoded.min(self.len);
        Ok(())
    }

    fn grow(&mut self) -> Result<(), FormatError> {
        let capacity = self.data.len();
        let exhausted = FormatError::BufferExhausted { capacity };
        let doubled = capacity.checked_mul(2).ok_or_else(|| exhausted.clone())?;
        self.data
            .try_reserve_exact(doubled - capacity)
            .map_err(|_| exhausted)?;
        self.data.resize(doubled, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn reads_lines_and_strips_newline() {
        let mut input = Cursor::new(b"abc\n\nxyz\n".to_vec());
        let mut buf = GrowableBuffer::with_capacity(64);

        assert_eq!(buf.read_line(&mut input).unwrap(), LineRead::Complete);
        assert_eq!(buf.as_slice(), b"abc");
        assert_eq!(buf.read_line(&mut input).unwrap(), LineRead::Complete);
        assert!(buf.is_empty());
        assert_eq!(buf.read_line(&mut input).unwrap(), LineRead::Complete);
        assert_eq!(buf.as_slice(), b"xyz");
        assert_eq!(buf.read_line(&mut input).unwrap(), LineRead::Eof);
    }

    #[test]
    fn unterminated_last_line_is_truncated() {
        let mut input = Cursor::new(b"abc".to_vec());
        let mut buf = GrowableBuffer::with_capacity(64);
        assert_eq!(buf.read_line(&mut input).unwrap(), LineRead::Truncated);
        assert_eq!(buf.as_slice(), b"abc");
    }

    #[test]
    fn doubles_when_line_does_not_fit() {
        let line = vec![b'x'; 40];
        let mut data = line.clone();
        data.push(b'\n');
        // A tiny BufReader forces the line to arrive in several chunks.
        let mut input = BufReader::with_capacity(7, Cursor::new(data));
        let mut buf = GrowableBuffer::with_capacity(16);

        assert_eq!(buf.read_line(&mut input).unwrap(), LineRead::Complete);
        assert_eq!(buf.as_slice(), &line[..]);
        assert_eq!(buf.capacity(), 64);
    }

    #[test]
    fn exact_fit_does_not_grow() {
        let mut data = vec![b'y'; 15];
        data.push(b'\n');
        let mut input = Cursor::new(data);
        let mut buf = GrowableBuffer::with_capacity(16);

        assert_eq!(buf.read_line(&mut input).unwrap(), LineRead::Complete);
        assert_eq!(buf.len(), 15);
        assert_eq!(buf.capacity(), 16);
    }

    #[test]
    fn grown_buffer_keeps_capacity_for_short_lines() {
        let mut data = vec![b'z'; 100];
        data.extend_from_slice(b"\nab\n");
        let mut input = Cursor::new(data);
        let mut buf = GrowableBuffer::with_capacity(16);

        buf.read_line(&mut input).unwrap();
        let grown = buf.capacity();
        buf.read_line(&mut input).unwrap();
        assert_eq!(buf.as_slice(), b"ab");
        assert_eq!(buf.capacity(), grown);
    }

    #[test]
    fn decode_in_place_shrinks_length() {
        let mut input = Cursor::new(b"abcd\n".to_vec());
        let mut buf = GrowableBuffer::with_capacity(16);
        buf.read_line(&mut input).unwrap();

        buf.decode_in_place(|bytes| {
            bytes[0] = b'z';
            Ok(1)
        })
        .unwrap();
        assert_eq!(buf.as_slice(), b"z");
    }
}
