//! Read and write transactions.

use crate::catalog::{merge_value, Catalog, DatabaseState};
use crate::cursor::Cursor;
use crate::env::Environment;
use crate::error::{display_name, StoreError, StoreResult};
use crate::log::{CommitRecord, CreatedDatabase, LoggedPut};
use crate::order::ByteOrder;
use crate::types::{DatabaseFlags, Dbi, PutFlags, TransactionId};
use parking_lot::{MutexGuard, RwLockReadGuard};
use std::collections::HashMap;
use tracing::debug;

/// State of a write transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

/// The environment's single write transaction.
///
/// Changes are invisible to readers until [`WriteTxn::commit`]. Dropping
/// an uncommitted transaction aborts it.
pub struct WriteTxn<'env> {
    env: &'env Environment,
    id: TransactionId,
    state: TransactionState,
    /// Databases created and pairs written, in log order.
    pub(crate) record: CommitRecord,
    /// Values staged per key: the replacement in a plain database, the new
    /// duplicates (sorted) in a `DUP_SORT` one. Committed values are never
    /// copied in here.
    pub(crate) writes: HashMap<(u32, Vec<u8>), Vec<Vec<u8>>>,
    _guard: MutexGuard<'env, ()>,
}

impl<'env> WriteTxn<'env> {
    pub(crate) fn new(env: &'env Environment, id: TransactionId, guard: MutexGuard<'env, ()>) -> Self {
        Self {
            env,
            id,
            state: TransactionState::Active,
            record: CommitRecord {
                txid: id.as_u64(),
                ..CommitRecord::default()
            },
            writes: HashMap::new(),
            _guard: guard,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Opens a database, creating it if absent.
    ///
    /// `name = None` is the environment's default database. Empty `flags`
    /// adopt whatever an existing database was created with.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::IncompatibleFlags`] when an existing database
    /// was created with different non-empty flags.
    pub fn open_database(&mut self, name: Option<&str>, flags: DatabaseFlags) -> StoreResult<Dbi> {
        self.ensure_active()?;

        if let Some((id, stored)) = self.find_database(name) {
            if !flags.is_empty() && flags != stored {
                return Err(StoreError::IncompatibleFlags {
                    name: display_name(name),
                    stored: stored.bits(),
                    requested: flags.bits(),
                });
            }
            self.env.register_handle(id);
            return Ok(Dbi(id));
        }

        let id = self.env.catalog.read().next_id() + self.record.created.len() as u32;
        self.record.created.push(CreatedDatabase {
            id,
            name: name.map(str::to_string),
            flags: flags.bits(),
        });
        self.env.register_handle(id);
        debug!(database = %display_name(name), flags = flags.bits(), "creating database");

        Ok(Dbi(id))
    }

    /// Opens a cursor for inserting into `dbi`.
    ///
    /// # Errors
    ///
    /// Fails if the transaction is finished or the handle was closed.
    pub fn cursor(&mut self, dbi: Dbi) -> StoreResult<Cursor<'_, 'env>> {
        self.ensure_active()?;
        let flags = self.database_flags(dbi)?;
        Ok(Cursor::new(self, dbi, flags))
    }

    /// Reads the first value stored under `key`, including this
    /// transaction's own writes.
    ///
    /// # Errors
    ///
    /// Fails if the handle is unknown or closed.
    pub fn get(&self, dbi: Dbi, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let flags = self.database_flags(dbi)?;
        Ok(self.first_value(dbi.0, flags, key))
    }

    /// Makes every change durable and visible, then ends the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit record cannot be written; nothing of
    /// this transaction is then visible or replayed.
    pub fn commit(mut self) -> StoreResult<TransactionId> {
        self.ensure_active()?;

        if !self.record.is_empty() {
            self.env.log.lock().append(&self.record)?;
        }

        let mut catalog = self.env.catalog.write();
        for created in &self.record.created {
            catalog.create(
                created.id,
                created.name.clone(),
                DatabaseFlags::from_bits_truncate(created.flags),
            )?;
        }
        for ((db, key), staged) in self.writes.drain() {
            catalog.merge_values(db, key, &staged);
        }
        catalog.set_last_txid(self.id.as_u64());
        drop(catalog);

        self.state = TransactionState::Committed;
        debug!(txn = %self.id, puts = self.record.puts.len(), "committed");
        Ok(self.id)
    }

    /// Discards every change and ends the transaction.
    pub fn abort(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        if self.state != TransactionState::Active {
            return;
        }
        for created in &self.record.created {
            self.env.close_database(Dbi(created.id));
        }
        self.state = TransactionState::Aborted;
        debug!(txn = %self.id, "aborted");
    }

    fn ensure_active(&self) -> StoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(StoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(StoreError::invalid_operation("transaction already aborted"))
            }
        }
    }

    fn find_database(&self, name: Option<&str>) -> Option<(u32, DatabaseFlags)> {
        let catalog = self.env.catalog.read();
        if let Some(id) = catalog.lookup(name) {
            return catalog.get(id).map(|db| (id, db.flags));
        }
        self.record
            .created
            .iter()
            .find(|created| created.name.as_deref() == name)
            .map(|created| (created.id, DatabaseFlags::from_bits_truncate(created.flags)))
    }

    pub(crate) fn database_flags(&self, dbi: Dbi) -> StoreResult<DatabaseFlags> {
        if !self.env.is_open(dbi.0) {
            return Err(StoreError::invalid_operation(format!(
                "database handle {dbi} is not open"
            )));
        }
        if let Some(db) = self.env.catalog.read().get(dbi.0) {
            return Ok(db.flags);
        }
        self.record
            .created
            .iter()
            .find(|created| created.id == dbi.0)
            .map(|created| DatabaseFlags::from_bits_truncate(created.flags))
            .ok_or_else(|| StoreError::invalid_operation(format!("unknown database handle {dbi}")))
    }

    fn first_value(&self, db: u32, flags: DatabaseFlags, key: &[u8]) -> Option<Vec<u8>> {
        let catalog = self.env.catalog.read();
        let committed = catalog
            .get(db)
            .and_then(|state| state.entries.get(key))
            .and_then(|values| values.first());
        let staged = self
            .writes
            .get(&(db, key.to_vec()))
            .and_then(|values| values.first());
        let first = match (staged, committed) {
            (Some(staged), Some(committed)) if flags.contains(DatabaseFlags::DUP_SORT) => {
                if ByteOrder::for_values(flags).compare(committed, staged).is_lt() {
                    committed
                } else {
                    staged
                }
            }
            (Some(staged), _) => staged,
            (None, committed) => committed?,
        };
        Some(first.clone())
    }

    /// Stages one put after checking `flags` against the committed and the
    /// already staged values of `key`.
    pub(crate) fn stage_put(
        &mut self,
        db: u32,
        db_flags: DatabaseFlags,
        key: &[u8],
        value: &[u8],
        flags: PutFlags,
    ) -> StoreResult<()> {
        let env = self.env;
        let catalog = env.catalog.read();
        let committed = catalog
            .get(db)
            .and_then(|state| state.entries.get(key))
            .map_or(&[][..], Vec::as_slice);
        let staged = self.writes.entry((db, key.to_vec())).or_default();

        let exists = !staged.is_empty() || !committed.is_empty();
        if flags.contains(PutFlags::NO_OVERWRITE) && exists {
            return Err(StoreError::KeyExist);
        }
        if flags.contains(PutFlags::NO_DUP_DATA) && db_flags.contains(DatabaseFlags::DUP_SORT) {
            let order = ByteOrder::for_values(db_flags);
            let holds = |values: &[Vec<u8>]| {
                values
                    .binary_search_by(|existing| order.compare(existing, value))
                    .is_ok()
            };
            if holds(staged.as_slice()) || holds(committed) {
                return Err(StoreError::KeyExist);
            }
        }

        merge_value(db_flags, staged, value);
        self.record.puts.push(LoggedPut {
            db,
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    pub(crate) fn max_key_size(&self) -> usize {
        self.env.max_key_size()
    }
}

impl Drop for WriteTxn<'_> {
    fn drop(&mut self) {
        self.discard();
    }
}

/// A read-only view of the committed state.
pub struct ReadTxn<'env> {
    catalog: RwLockReadGuard<'env, Catalog>,
}

impl<'env> ReadTxn<'env> {
    pub(crate) fn new(catalog: RwLockReadGuard<'env, Catalog>) -> Self {
        Self { catalog }
    }

    /// Looks up an existing database.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::DatabaseNotFound`] if it was never committed.
    pub fn open_database(&self, name: Option<&str>) -> StoreResult<Dbi> {
        self.catalog
            .lookup(name)
            .map(Dbi)
            .ok_or_else(|| StoreError::DatabaseNotFound {
                name: display_name(name),
            })
    }

    /// Names of every database, `None` being the default one.
    #[must_use]
    pub fn database_names(&self) -> Vec<Option<String>> {
        self.catalog.names()
    }

    /// Flags the database was created with.
    ///
    /// # Errors
    ///
    /// Fails if the handle is unknown.
    pub fn flags(&self, dbi: Dbi) -> StoreResult<DatabaseFlags> {
        Ok(self.database(dbi)?.flags)
    }

    /// First value stored under `key`.
    ///
    /// # Errors
    ///
    /// Fails if the handle is unknown.
    pub fn get(&self, dbi: Dbi, key: &[u8]) -> StoreResult<Option<&[u8]>> {
        Ok(self
            .database(dbi)?
            .entries
            .get(key)
            .and_then(|values| values.first())
            .map(Vec::as_slice))
    }

    /// Every pair in key order, duplicates in value order.
    ///
    /// # Errors
    ///
    /// Fails if the handle is unknown.
    pub fn entries(&self, dbi: Dbi) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self.database(dbi)?.sorted_pairs())
    }

    /// Number of pairs, counting each duplicate value.
    ///
    /// # Errors
    ///
    /// Fails if the handle is unknown.
    pub fn len(&self, dbi: Dbi) -> StoreResult<usize> {
        Ok(self.database(dbi)?.len())
    }

    /// ID of the last committed write transaction, zero if none.
    #[must_use]
    pub fn last_txid(&self) -> TransactionId {
        TransactionId::new(self.catalog.last_txid())
    }

    fn database(&self, dbi: Dbi) -> StoreResult<&DatabaseState> {
        self.catalog
            .get(dbi.0)
            .ok_or_else(|| StoreError::invalid_operation(format!("unknown database handle {dbi}")))
    }
}
