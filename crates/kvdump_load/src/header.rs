//! Section headers.
//!
//! A header is a run of `keyword=value` lines closed by `HEADER=END`.
//! Keywords are matched exactly and case-sensitively against a table;
//! unknown keywords are logged and skipped.

use crate::buffer::GrowableBuffer;
use crate::codec::FormatMode;
use crate::error::{FormatError, LoadResult};
use crate::line::LineDecoder;
use crate::session::LoaderSession;
use kvdump_store::DatabaseFlags;
use std::io::BufRead;
use tracing::{debug, warn};

/// Newest dump version this loader reads.
pub const MAX_VERSION: u32 = 3;

/// Line that closes a header block.
pub const HEADER_END: &[u8] = b"HEADER=END";

/// Settings collected from one header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    /// Dump format version.
    pub version: u32,
    /// Encoding of the section's payloads.
    pub format: FormatMode,
    /// Target sub-database; `None` is the default database.
    pub database: Option<String>,
    /// Flags to create the sub-database with.
    pub flags: DatabaseFlags,
}

impl HeaderBlock {
    /// A block before any header line is applied. The database carries
    /// over from the previous section.
    #[must_use]
    pub fn new(database: Option<String>) -> Self {
        Self {
            version: MAX_VERSION,
            format: FormatMode::HexPairs,
            database,
            flags: DatabaseFlags::empty(),
        }
    }
}

/// What one header line did.
#[derive(Debug, PartialEq, Eq)]
pub enum HeaderLine<'a> {
    /// The line set a field.
    Applied,
    /// The keyword is unknown; the line was skipped.
    Ignored(&'a [u8]),
    /// The line was `HEADER=END`.
    End,
}

type Handler = fn(&mut HeaderBlock, &[u8]) -> Result<(), FormatError>;

const KEYWORDS: &[(&str, Handler)] = &[
    ("VERSION", set_version),
    ("format", set_format),
    ("database", set_database),
    ("type", check_type),
];

const FLAG_KEYWORDS: &[(&str, DatabaseFlags)] = &[
    ("reversekey", DatabaseFlags::REVERSE_KEY),
    ("dupsort", DatabaseFlags::DUP_SORT),
    ("integerkey", DatabaseFlags::INTEGER_KEY),
    ("dupfixed", DatabaseFlags::DUP_FIXED),
    ("integerdup", DatabaseFlags::INTEGER_DUP),
    ("reversedup", DatabaseFlags::REVERSE_DUP),
];

fn set_version(block: &mut HeaderBlock, value: &[u8]) -> Result<(), FormatError> {
    let text = String::from_utf8_lossy(value);
    let version: u32 = text
        .trim()
        .parse()
        .map_err(|_| FormatError::InvalidVersion(text.to_string()))?;
    if version > MAX_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }
    block.version = version;
    Ok(())
}

fn set_format(block: &mut HeaderBlock, value: &[u8]) -> Result<(), FormatError> {
    block.format = FormatMode::from_header_value(value)
        .ok_or_else(|| FormatError::UnsupportedFormat(String::from_utf8_lossy(value).into()))?;
    Ok(())
}

/// Database names are `String`s throughout the store, so a `database=` value
/// must be UTF-8. Dumps naming a database with arbitrary bytes are rejected
/// with [`FormatError::InvalidDatabaseName`] rather than loaded under a
/// lossy name.
fn set_database(block: &mut HeaderBlock, value: &[u8]) -> Result<(), FormatError> {
    let name = std::str::from_utf8(value).map_err(|_| FormatError::InvalidDatabaseName)?;
    block.database = Some(name.to_string());
    Ok(())
}

fn check_type(_block: &mut HeaderBlock, value: &[u8]) -> Result<(), FormatError> {
    if value == b"btree" {
        Ok(())
    } else {
        Err(FormatError::UnsupportedType(
            String::from_utf8_lossy(value).into(),
        ))
    }
}

/// Applies one header line (newline already stripped) to `block`.
///
/// # Errors
///
/// [`FormatError::MalformedHeaderLine`] for a line without `=`, or the
/// keyword handler's rejection of its value.
pub fn apply_header_line<'a>(
    block: &mut HeaderBlock,
    line: &'a [u8],
) -> Result<HeaderLine<'a>, FormatError> {
    if line == HEADER_END {
        return Ok(HeaderLine::End);
    }
    let eq = line
        .iter()
        .position(|&b| b == b'=')
        .ok_or(FormatError::MalformedHeaderLine)?;
    let (keyword, value) = (&line[..eq], &line[eq + 1..]);

    if let Some((_, handler)) = KEYWORDS.iter().find(|(k, _)| k.as_bytes() == keyword) {
        handler(block, value)?;
        return Ok(HeaderLine::Applied);
    }
    if let Some((_, flag)) = FLAG_KEYWORDS.iter().find(|(k, _)| k.as_bytes() == keyword) {
        block.flags |= *flag;
        return Ok(HeaderLine::Applied);
    }
    Ok(HeaderLine::Ignored(keyword))
}

/// Reads one header block and makes it the session's current section.
///
/// Returns `None` if the input is exhausted before the header starts.
///
/// # Errors
///
/// Fails on a rejected header line, or with [`FormatError::UnexpectedEof`]
/// if the input ends before `HEADER=END`.
pub fn parse_header<R: BufRead>(
    decoder: &mut LineDecoder<R>,
    session: &mut LoaderSession,
    buf: &mut GrowableBuffer,
) -> LoadResult<Option<HeaderBlock>> {
    let mut block = HeaderBlock::new(session.database.clone());
    let mut started = false;

    loop {
        let Some(line) = decoder.next_line(session, buf)? else {
            if started {
                return Err(session.format_error(FormatError::UnexpectedEof));
            }
            return Ok(None);
        };
        started = true;

        match apply_header_line(&mut block, line).map_err(|err| session.format_error(err))? {
            HeaderLine::End => break,
            HeaderLine::Applied => {}
            HeaderLine::Ignored(keyword) => warn!(
                line = session.line,
                keyword = %String::from_utf8_lossy(keyword),
                "unrecognized keyword ignored"
            ),
        }
    }

    debug!(
        line = session.line,
        version = block.version,
        format = block.format.header_value(),
        database = block.database.as_deref().unwrap_or("<main>"),
        flags = block.flags.bits(),
        "parsed header"
    );
    session.apply_header(&block);
    Ok(Some(block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadOptions;
    use std::io::Cursor;

    fn parse(input: &[u8]) -> (LoadResult<Option<HeaderBlock>>, LoaderSession) {
        let mut session = LoaderSession::new(&LoadOptions::new());
        let mut decoder = LineDecoder::new(Cursor::new(input.to_vec()));
        let mut buf = GrowableBuffer::with_capacity(16);
        let result = parse_header(&mut decoder, &mut session, &mut buf);
        (result, session)
    }

    fn rejection(input: &[u8]) -> FormatError {
        let (result, _) = parse(input);
        result.unwrap_err().format_error().cloned().unwrap()
    }

    #[test]
    fn full_header() {
        let (result, session) = parse(
            b"VERSION=3\nformat=print\ndatabase=users\ntype=btree\ndupsort=1\nintegerkey=1\nHEADER=END\n",
        );
        let block = result.unwrap().unwrap();
        assert_eq!(block.version, 3);
        assert_eq!(block.format, FormatMode::EscapedText);
        assert_eq!(block.database.as_deref(), Some("users"));
        assert_eq!(
            block.flags,
            DatabaseFlags::DUP_SORT | DatabaseFlags::INTEGER_KEY
        );

        assert_eq!(session.line, 7);
        assert_eq!(session.format, FormatMode::EscapedText);
        assert_eq!(session.database.as_deref(), Some("users"));
    }

    #[test]
    fn empty_input_is_clean_end() {
        let (result, session) = parse(b"");
        assert!(result.unwrap().is_none());
        assert!(session.eof);
    }

    #[test]
    fn minimal_header_defaults_to_hex() {
        let (result, _) = parse(b"HEADER=END\n");
        let block = result.unwrap().unwrap();
        assert_eq!(block.format, FormatMode::HexPairs);
        assert!(block.flags.is_empty());
        assert!(block.database.is_none());
    }

    #[test]
    fn version_above_three_rejected() {
        assert_eq!(
            rejection(b"VERSION=4\nHEADER=END\n"),
            FormatError::UnsupportedVersion(4)
        );
    }

    #[test]
    fn non_numeric_version_rejected() {
        assert!(matches!(
            rejection(b"VERSION=three\nHEADER=END\n"),
            FormatError::InvalidVersion(_)
        ));
    }

    #[test]
    fn non_btree_type_rejected() {
        assert_eq!(
            rejection(b"type=hash\nHEADER=END\n"),
            FormatError::UnsupportedType("hash".into())
        );
    }

    #[test]
    fn unknown_format_rejected() {
        assert_eq!(
            rejection(b"format=Print\nHEADER=END\n"),
            FormatError::UnsupportedFormat("Print".into())
        );
    }

    #[test]
    fn line_without_equals_rejected() {
        let (result, _) = parse(b"VERSION=3\ngarbage\nHEADER=END\n");
        let err = result.unwrap_err();
        assert_eq!(err.format_error(), Some(&FormatError::MalformedHeaderLine));
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let mut block = HeaderBlock::new(None);
        assert_eq!(
            apply_header_line(&mut block, b"Format=print").unwrap(),
            HeaderLine::Ignored(b"Format")
        );
        assert_eq!(
            apply_header_line(&mut block, b"DUPSORT=1").unwrap(),
            HeaderLine::Ignored(b"DUPSORT")
        );
        assert_eq!(block, HeaderBlock::new(None));
    }

    #[test]
    fn unknown_keywords_are_skipped() {
        let (result, session) = parse(b"mapsize=1048576\nmaxreaders=126\nHEADER=END\n");
        assert!(result.unwrap().is_some());
        assert_eq!(session.line, 3);
    }

    #[test]
    fn eof_inside_header_rejected() {
        let (result, _) = parse(b"VERSION=3\nformat=bytevalue\n");
        let err = result.unwrap_err();
        assert_eq!(err.format_error(), Some(&FormatError::UnexpectedEof));
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn database_value_keeps_equals_signs() {
        let mut block = HeaderBlock::new(None);
        apply_header_line(&mut block, b"database=a=b").unwrap();
        assert_eq!(block.database.as_deref(), Some("a=b"));
    }

    #[test]
    fn non_utf8_database_name_rejected() {
        assert_eq!(
            rejection(b"database=\xffidx\nHEADER=END\n"),
            FormatError::InvalidDatabaseName
        );
    }

    #[test]
    fn database_carries_over_between_sections() {
        let mut session = LoaderSession::new(&LoadOptions::new().database("seed"));
        let mut decoder = LineDecoder::new(Cursor::new(b"HEADER=END\n".to_vec()));
        let mut buf = GrowableBuffer::with_capacity(16);
        let block = parse_header(&mut decoder, &mut session, &mut buf)
            .unwrap()
            .unwrap();
        assert_eq!(block.database.as_deref(), Some("seed"));
    }
}
