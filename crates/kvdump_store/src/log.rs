//! Commit log: one framed record per committed write transaction.
//!
//! ## Frame layout
//!
//! ```text
//! magic "KVDC" (4) | version u16 LE (2) | payload length u32 LE (4)
//! | CBOR payload | CRC32 over everything before it (4)
//! ```
//!
//! A record is only ever appended as a whole by `commit`. On open, a short
//! or checksum-mismatched *final* record is a torn commit and is truncated
//! away; a bad record followed by further bytes is corruption.

use crate::error::{StoreError, StoreResult};
use kvdump_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Magic bytes identifying a commit record.
pub const LOG_MAGIC: [u8; 4] = *b"KVDC";

/// Current commit log format version.
pub const LOG_VERSION: u16 = 1;

/// magic (4) + version (2) + length (4)
const HEADER_SIZE: usize = 10;

const CRC_SIZE: usize = 4;

/// A database created by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CreatedDatabase {
    pub id: u32,
    pub name: Option<String>,
    pub flags: u32,
}

/// A key/value pair written by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LoggedPut {
    pub db: u32,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Payload of one commit record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CommitRecord {
    pub txid: u64,
    pub created: Vec<CreatedDatabase>,
    pub puts: Vec<LoggedPut>,
}

impl CommitRecord {
    pub(crate) fn is_empty(&self) -> bool {
        self.created.is_empty() && self.puts.is_empty()
    }

    fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut payload = Vec::new();
        ciborium::ser::into_writer(self, &mut payload)
            .map_err(|err| StoreError::encoding(err.to_string()))?;
        Ok(payload)
    }

    fn decode(payload: &[u8]) -> StoreResult<Self> {
        ciborium::de::from_reader(payload).map_err(|err| StoreError::encoding(err.to_string()))
    }
}

/// Appends and replays commit records over a storage backend.
pub(crate) struct CommitLog {
    backend: Box<dyn StorageBackend>,
    sync_on_commit: bool,
}

impl CommitLog {
    pub(crate) fn new(backend: Box<dyn StorageBackend>, sync_on_commit: bool) -> Self {
        Self {
            backend,
            sync_on_commit,
        }
    }

    /// Makes `record` durable.
    ///
    /// On failure the log is cut back to its previous length so that a
    /// partially written frame never precedes a later commit.
    pub(crate) fn append(&mut self, record: &CommitRecord) -> StoreResult<u64> {
        let frame = encode_frame(&record.encode()?)?;
        let start = self.backend.size()?;

        let result = self.write_frame(&frame);
        if result.is_err() {
            if let Err(err) = self.backend.truncate(start) {
                warn!(offset = start, error = %err, "failed to discard partial commit record");
            }
        }
        result.map(|()| start)
    }

    fn write_frame(&mut self, frame: &[u8]) -> StoreResult<()> {
        self.backend.append(frame)?;
        self.backend.flush()?;
        if self.sync_on_commit {
            self.backend.sync()?;
        }
        Ok(())
    }

    /// Reads every committed record, truncating a torn final record.
    pub(crate) fn replay(&mut self) -> StoreResult<Vec<CommitRecord>> {
        let data = self.backend.read_all()?;
        let mut records = Vec::new();
        let mut offset = 0usize;

        while offset < data.len() {
            match decode_frame(&data[offset..]) {
                Ok((payload, frame_len)) => {
                    records.push(CommitRecord::decode(payload)?);
                    offset += frame_len;
                }
                Err(FrameError::Torn(reason)) => {
                    warn!(offset, reason, "discarding torn commit record");
                    self.backend.truncate(offset as u64)?;
                    break;
                }
                Err(FrameError::Corrupt(reason)) => {
                    return Err(StoreError::log_corruption(offset as u64, reason));
                }
            }
        }

        Ok(records)
    }

    pub(crate) fn sync(&mut self) -> StoreResult<()> {
        self.backend.flush()?;
        self.backend.sync()?;
        Ok(())
    }
}

enum FrameError {
    Torn(&'static str),
    Corrupt(&'static str),
}

fn encode_frame(payload: &[u8]) -> StoreResult<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| StoreError::invalid_operation("commit record payload too large"))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
    frame.extend_from_slice(&LOG_MAGIC);
    frame.extend_from_slice(&LOG_VERSION.to_le_bytes());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    let crc = crc32fast::hash(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

/// Splits the first frame off `data`, returning its payload and total length.
fn decode_frame(data: &[u8]) -> Result<(&[u8], usize), FrameError> {
    if data.len() < HEADER_SIZE {
        return Err(FrameError::Torn("short header"));
    }
    if data[0..4] != LOG_MAGIC {
        return Err(FrameError::Corrupt("bad magic"));
    }
    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != LOG_VERSION {
        return Err(FrameError::Corrupt("unsupported log version"));
    }
    let len = u32::from_le_bytes([data[6], data[7], data[8], data[9]]) as usize;
    let frame_len = HEADER_SIZE + len + CRC_SIZE;
    if data.len() < frame_len {
        return Err(FrameError::Torn("short payload"));
    }

    let body_end = HEADER_SIZE + len;
    let stored = u32::from_le_bytes([
        data[body_end],
        data[body_end + 1],
        data[body_end + 2],
        data[body_end + 3],
    ]);
    if stored != crc32fast::hash(&data[..body_end]) {
        return Err(if data.len() == frame_len {
            FrameError::Torn("checksum mismatch")
        } else {
            FrameError::Corrupt("checksum mismatch")
        });
    }

    Ok((&data[HEADER_SIZE..body_end], frame_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvdump_storage::InMemoryBackend;

    fn record(txid: u64, key: &[u8]) -> CommitRecord {
        CommitRecord {
            txid,
            created: vec![],
            puts: vec![LoggedPut {
                db: 0,
                key: key.to_vec(),
                value: b"v".to_vec(),
            }],
        }
    }

    #[test]
    fn trailer_covers_header_and_payload() {
        let frame = encode_frame(b"payload").unwrap();
        let (body, trailer) = frame.split_at(frame.len() - CRC_SIZE);
        assert_eq!(trailer, crc32fast::hash(body).to_le_bytes());

        let mut flipped = frame.clone();
        flipped[2] ^= 0x01;
        assert!(decode_frame(&flipped).is_err());
    }

    #[test]
    fn replay_returns_appended_records() {
        let backend = InMemoryBackend::new();
        let mut log = CommitLog::new(Box::new(backend.clone()), true);
        log.append(&record(1, b"a")).unwrap();
        log.append(&record(2, b"b")).unwrap();

        let mut reopened = CommitLog::new(Box::new(backend), true);
        let records = reopened.replay().unwrap();
        assert_eq!(records, vec![record(1, b"a"), record(2, b"b")]);
    }

    #[test]
    fn replay_truncates_torn_tail() {
        let backend = InMemoryBackend::new();
        let mut log = CommitLog::new(Box::new(backend.clone()), true);
        log.append(&record(1, b"a")).unwrap();
        let committed = backend.data().len();

        let frame = encode_frame(&record(2, b"b").encode().unwrap()).unwrap();
        let mut torn = backend.data();
        torn.extend_from_slice(&frame[..frame.len() - 3]);
        let torn_backend = InMemoryBackend::with_data(torn);

        let mut reopened = CommitLog::new(Box::new(torn_backend.clone()), true);
        let records = reopened.replay().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(torn_backend.data().len(), committed);
    }

    #[test]
    fn replay_rejects_corruption_before_tail() {
        let backend = InMemoryBackend::new();
        let mut log = CommitLog::new(Box::new(backend.clone()), true);
        log.append(&record(1, b"a")).unwrap();
        log.append(&record(2, b"b")).unwrap();

        let mut data = backend.data();
        data[HEADER_SIZE] ^= 0xFF;
        let mut reopened = CommitLog::new(Box::new(InMemoryBackend::with_data(data)), true);
        assert!(matches!(
            reopened.replay(),
            Err(StoreError::LogCorruption { offset: 0, .. })
        ));
    }
}
