//! Key and duplicate-value ordering derived from database flags.

use crate::types::DatabaseFlags;
use std::cmp::Ordering;

/// How a sequence of bytes is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ByteOrder {
    Lexicographic,
    Reverse,
    Integer,
}

impl ByteOrder {
    /// Ordering applied to keys.
    pub(crate) fn for_keys(flags: DatabaseFlags) -> Self {
        if flags.contains(DatabaseFlags::INTEGER_KEY) {
            Self::Integer
        } else if flags.contains(DatabaseFlags::REVERSE_KEY) {
            Self::Reverse
        } else {
            Self::Lexicographic
        }
    }

    /// Ordering applied to the values of one key in a `DUP_SORT` database.
    pub(crate) fn for_values(flags: DatabaseFlags) -> Self {
        if flags.contains(DatabaseFlags::INTEGER_DUP) {
            Self::Integer
        } else if flags.contains(DatabaseFlags::REVERSE_DUP) {
            Self::Reverse
        } else {
            Self::Lexicographic
        }
    }

    pub(crate) fn compare(self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            Self::Lexicographic => a.cmp(b),
            Self::Reverse => a.iter().rev().cmp(b.iter().rev()),
            Self::Integer => match (as_integer(a), as_integer(b)) {
                (Some(x), Some(y)) if a.len() == b.len() => x.cmp(&y),
                _ => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            },
        }
    }
}

/// Reads a 4- or 8-byte native-endian unsigned integer.
pub(crate) fn as_integer(bytes: &[u8]) -> Option<u64> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes)
            .ok()
            .map(|b| u64::from(u32::from_ne_bytes(b))),
        8 => <[u8; 8]>::try_from(bytes).ok().map(u64::from_ne_bytes),
        _ => None,
    }
}
