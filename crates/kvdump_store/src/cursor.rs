//! Insertion cursor over one database inside a write transaction.

use crate::error::{StoreError, StoreResult};
use crate::order::as_integer;
use crate::txn::WriteTxn;
use crate::types::{DatabaseFlags, Dbi, PutFlags};

/// A positioned insertion handle.
///
/// The cursor borrows its transaction mutably, so the transaction cannot
/// commit while a cursor is alive; open a new cursor after each commit.
pub struct Cursor<'txn, 'env> {
    txn: &'txn mut WriteTxn<'env>,
    dbi: Dbi,
    flags: DatabaseFlags,
    position: Option<Vec<u8>>,
}

impl<'txn, 'env> Cursor<'txn, 'env> {
    pub(crate) fn new(txn: &'txn mut WriteTxn<'env>, dbi: Dbi, flags: DatabaseFlags) -> Self {
        Self {
            txn,
            dbi,
            flags,
            position: None,
        }
    }

    /// The database this cursor writes to.
    #[must_use]
    pub fn dbi(&self) -> Dbi {
        self.dbi
    }

    /// Key of the most recent successful put.
    #[must_use]
    pub fn position(&self) -> Option<&[u8]> {
        self.position.as_deref()
    }

    /// Stores `value` under `key`.
    ///
    /// Without flags, a plain database overwrites and a `DUP_SORT` database
    /// adds `value` to the key's sorted value set.
    ///
    /// # Errors
    ///
    /// - [`StoreError::BadValueSize`] for an empty or oversized key, a
    ///   non-integer-sized key in an `INTEGER_KEY` database, or an oversized
    ///   duplicate value
    /// - [`StoreError::KeyExist`] when `NO_OVERWRITE` finds the key, or
    ///   `NO_DUP_DATA` finds the exact pair in a `DUP_SORT` database
    pub fn put(&mut self, key: &[u8], value: &[u8], flags: PutFlags) -> StoreResult<()> {
        self.check_sizes(key, value)?;

        self.txn.stage_put(self.dbi.as_u32(), self.flags, key, value, flags)?;
        self.position = Some(key.to_vec());
        Ok(())
    }

    fn check_sizes(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let max = self.txn.max_key_size();
        if key.is_empty() || key.len() > max {
            return Err(StoreError::bad_value_size(format!(
                "key of {} bytes, allowed 1..={max}",
                key.len()
            )));
        }
        if self.flags.contains(DatabaseFlags::INTEGER_KEY) && as_integer(key).is_none() {
            return Err(StoreError::bad_value_size(format!(
                "integer key of {} bytes, expected 4 or 8",
                key.len()
            )));
        }
        if self.flags.contains(DatabaseFlags::DUP_SORT) && value.len() > max {
            return Err(StoreError::bad_value_size(format!(
                "duplicate value of {} bytes, allowed up to {max}",
                value.len()
            )));
        }
        Ok(())
    }
}
