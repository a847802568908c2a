//! Framed record lines.
//!
//! With framing on, every record line starts with one space and a section
//! ends at a `DATA=END` line or at the end of input. Without framing each
//! line is a payload and only the end of input ends the section.

use crate::buffer::{GrowableBuffer, LineRead};
use crate::error::{FormatError, LoadResult, ReadError};
use crate::session::LoaderSession;
use std::io::{BufRead, ErrorKind};

/// What one decode call produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded<'buf> {
    /// A decoded key or value, borrowed from the scratch buffer until the
    /// next decode into it.
    Record(&'buf [u8]),
    /// The section has no more records.
    EndOfSection,
}

/// Pulls lines off a dump stream.
#[derive(Debug)]
pub struct LineDecoder<R> {
    reader: R,
}

impl<R: BufRead> LineDecoder<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads one unframed line into `buf`.
    ///
    /// Returns `None` if the input is exhausted before the line starts.
    ///
    /// # Errors
    ///
    /// [`FormatError::UnexpectedEof`] if the input ends mid-line.
    pub fn next_line<'buf>(
        &mut self,
        session: &mut LoaderSession,
        buf: &'buf mut GrowableBuffer,
    ) -> LoadResult<Option<&'buf [u8]>> {
        match buf
            .read_line(&mut self.reader)
            .map_err(|err| err.at(session.line + 1))?
        {
            LineRead::Eof => {
                session.eof = true;
                Ok(None)
            }
            LineRead::Truncated => {
                session.begin_line();
                session.eof = true;
                Err(session.format_error(FormatError::UnexpectedEof))
            }
            LineRead::Complete => {
                session.begin_line();
                Ok(Some(buf.as_slice()))
            }
        }
    }

    /// Decodes the next key or value into `buf` using the session's format.
    ///
    /// # Errors
    ///
    /// Fails on malformed framing, bad encoding, an unexpected end of input,
    /// or a read error, tagged with the offending line.
    pub fn decode<'buf>(
        &mut self,
        session: &mut LoaderSession,
        buf: &'buf mut GrowableBuffer,
    ) -> LoadResult<Decoded<'buf>> {
        if session.framing {
            let first = self
                .read_byte()
                .map_err(|err| ReadError::from(err).at(session.line + 1))?;
            match first {
                None => {
                    session.eof = true;
                    return Ok(Decoded::EndOfSection);
                }
                Some(b' ') => {}
                Some(b'\n') => {
                    session.begin_line();
                    return Err(session.format_error(FormatError::MalformedFraming));
                }
                Some(first) => return self.end_of_section(session, buf, first),
            }
            session.begin_line();
            match buf
                .read_line(&mut self.reader)
                .map_err(|err| err.at(session.line))?
            {
                LineRead::Complete => {}
                LineRead::Eof | LineRead::Truncated => {
                    session.eof = true;
                    return Err(session.format_error(FormatError::UnexpectedEof));
                }
            }
        } else {
            match self.next_line(session, buf)? {
                Some(_) => {}
                None => return Ok(Decoded::EndOfSection),
            }
        }

        let format = session.format;
        buf.decode_in_place(|bytes| format.decode_in_place(bytes))
            .map_err(|err| session.format_error(err))?;
        Ok(Decoded::Record(buf.as_slice()))
    }

    /// Checks that a line opening with `first` (not a space) is `DATA=END`.
    fn end_of_section<'buf>(
        &mut self,
        session: &mut LoaderSession,
        buf: &'buf mut GrowableBuffer,
        first: u8,
    ) -> LoadResult<Decoded<'buf>> {
        session.begin_line();
        let read = buf
            .read_line(&mut self.reader)
            .map_err(|err| err.at(session.line))?;
        if read == LineRead::Eof || read == LineRead::Truncated {
            session.eof = true;
        }
        if read != LineRead::Eof && first == b'D' && buf.as_slice() == b"ATA=END" {
            return Ok(Decoded::EndOfSection);
        }
        Err(session.format_error(FormatError::MalformedFraming))
    }

    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            let Some(&byte) = available.first() else {
                return Ok(None);
            };
            self.reader.consume(1);
            return Ok(Some(byte));
        }
    }
}
