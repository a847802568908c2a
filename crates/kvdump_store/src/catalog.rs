//! Committed state of every database in an environment.

use crate::error::{display_name, StoreError, StoreResult};
use crate::log::CommitRecord;
use crate::order::ByteOrder;
use crate::types::DatabaseFlags;
use std::collections::{BTreeMap, HashMap};

/// One database: its identity, flags, and committed contents.
///
/// Each key maps to its values. A non-`DUP_SORT` database holds exactly
/// one value per key; a `DUP_SORT` database keeps them in value order.
#[derive(Debug, Clone)]
pub(crate) struct DatabaseState {
    pub name: Option<String>,
    pub flags: DatabaseFlags,
    pub entries: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
}

impl DatabaseState {
    pub(crate) fn new(name: Option<String>, flags: DatabaseFlags) -> Self {
        Self {
            name,
            flags,
            entries: BTreeMap::new(),
        }
    }

    /// Number of key/value pairs, counting each duplicate value.
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// All pairs in the database's key order, then value order.
    pub(crate) fn sorted_pairs(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        let order = ByteOrder::for_keys(self.flags);
        let mut keys: Vec<&Vec<u8>> = self.entries.keys().collect();
        keys.sort_by(|a, b| order.compare(a, b));

        keys.into_iter()
            .flat_map(|key| {
                self.entries[key]
                    .iter()
                    .map(move |value| (key.clone(), value.clone()))
            })
            .collect()
    }
}

/// Applies a plain (flag-less) put to a key's value list.
///
/// Overwrites in a plain database; inserts into the sorted set in a
/// `DUP_SORT` database, leaving an identical pair untouched.
pub(crate) fn merge_value(flags: DatabaseFlags, values: &mut Vec<Vec<u8>>, value: &[u8]) {
    if !flags.contains(DatabaseFlags::DUP_SORT) {
        values.clear();
        values.push(value.to_vec());
        return;
    }
    let order = ByteOrder::for_values(flags);
    if let Err(pos) = values.binary_search_by(|probe| order.compare(probe, value)) {
        values.insert(pos, value.to_vec());
    }
}

/// Every committed database, addressed by a stable numeric id.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    databases: Vec<DatabaseState>,
    by_name: HashMap<Option<String>, u32>,
    last_txid: u64,
}

impl Catalog {
    pub(crate) fn lookup(&self, name: Option<&str>) -> Option<u32> {
        self.by_name.get(&name.map(str::to_string)).copied()
    }

    pub(crate) fn get(&self, id: u32) -> Option<&DatabaseState> {
        self.databases.get(id as usize)
    }

    pub(crate) fn next_id(&self) -> u32 {
        self.databases.len() as u32
    }

    pub(crate) fn last_txid(&self) -> u64 {
        self.last_txid
    }

    pub(crate) fn names(&self) -> Vec<Option<String>> {
        self.databases.iter().map(|db| db.name.clone()).collect()
    }

    /// Registers a database created by a commit.
    pub(crate) fn create(
        &mut self,
        id: u32,
        name: Option<String>,
        flags: DatabaseFlags,
    ) -> StoreResult<()> {
        if id != self.next_id() || self.by_name.contains_key(&name) {
            return Err(StoreError::invalid_operation(format!(
                "database {} created twice or out of order (id {id})",
                display_name(name.as_deref())
            )));
        }
        self.by_name.insert(name.clone(), id);
        self.databases.push(DatabaseState::new(name, flags));
        Ok(())
    }

    /// Folds a transaction's staged values for one key into the committed set.
    pub(crate) fn merge_values(&mut self, id: u32, key: Vec<u8>, staged: &[Vec<u8>]) {
        if staged.is_empty() {
            return;
        }
        if let Some(db) = self.databases.get_mut(id as usize) {
            let flags = db.flags;
            let values = db.entries.entry(key).or_default();
            for value in staged {
                merge_value(flags, values, value);
            }
        }
    }

    /// Replays one commit record read back from the log.
    pub(crate) fn apply_record(&mut self, record: &CommitRecord) -> StoreResult<()> {
        for created in &record.created {
            self.create(
                created.id,
                created.name.clone(),
                DatabaseFlags::from_bits_truncate(created.flags),
            )?;
        }
        for put in &record.puts {
            let db = self
                .databases
                .get_mut(put.db as usize)
                .ok_or_else(|| {
                    StoreError::invalid_operation(format!("put into unknown database id {}", put.db))
                })?;
            let flags = db.flags;
            let values = db.entries.entry(put.key.clone()).or_default();
            merge_value(flags, values, &put.value);
        }
        self.last_txid = self.last_txid.max(record.txid);
        Ok(())
    }

    pub(crate) fn set_last_txid(&mut self, txid: u64) {
        self.last_txid = self.last_txid.max(txid);
    }
}
