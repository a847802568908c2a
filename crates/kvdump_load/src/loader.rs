//! Applying decoded records to the store in bounded transactions.

use crate::buffer::GrowableBuffer;
use crate::config::LoadOptions;
use crate::error::{FormatError, LoadError, LoadResult};
use crate::header::parse_header;
use crate::line::{Decoded, LineDecoder};
use crate::session::LoaderSession;
use kvdump_store::{Dbi, Environment, PutFlags, WriteTxn};
use serde::Serialize;
use std::io::BufRead;
use tracing::{debug, info, warn};

/// Initial capacity of the value scratch buffer.
pub const VALUE_BUFFER_SIZE: usize = 4096;

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Sections loaded.
    pub sections: u64,
    /// Key/value pairs written.
    pub records: u64,
    /// Pairs skipped because the key already existed.
    pub duplicates: u64,
    /// Transactions committed.
    pub batches: u64,
    /// Input lines consumed.
    pub lines: u64,
}

/// How a batch ended.
enum BatchEnd {
    /// The batch reached its size limit; more records may follow.
    Full,
    /// The section ran out of records.
    SectionDone,
}

/// Drives a dump stream section by section into an environment.
///
/// Each section's records are written through a cursor and committed every
/// `batch_size` applied records, so a failure only loses the open batch.
///
/// # Example
///
/// ```rust
/// use kvdump_load::{BatchLoader, LoadOptions};
/// use kvdump_store::{EnvConfig, Environment};
/// use kvdump_storage::InMemoryBackend;
///
/// let env = Environment::with_backend(Box::new(InMemoryBackend::new()), EnvConfig::new()).unwrap();
/// let dump = b"VERSION=3\nformat=bytevalue\ntype=btree\nHEADER=END\n 6b\n 76\nDATA=END\n";
///
/// let stats = BatchLoader::new(&env, &dump[..], LoadOptions::new())
///     .unwrap()
///     .run()
///     .unwrap();
/// assert_eq!(stats.records, 1);
/// ```
pub struct BatchLoader<'env, R> {
    env: &'env Environment,
    decoder: LineDecoder<R>,
    session: LoaderSession,
    options: LoadOptions,
    keys: GrowableBuffer,
    values: GrowableBuffer,
    stats: LoadStats,
}

impl<'env, R: BufRead> BatchLoader<'env, R> {
    /// Prepares a run reading from `reader`.
    ///
    /// # Errors
    ///
    /// [`LoadError::Config`] for a zero batch size.
    pub fn new(env: &'env Environment, reader: R, options: LoadOptions) -> LoadResult<Self> {
        if options.batch_size == 0 {
            return Err(LoadError::config("batch size must be at least 1"));
        }
        Ok(Self {
            env,
            decoder: LineDecoder::new(reader),
            session: LoaderSession::new(&options),
            keys: GrowableBuffer::with_capacity(env.max_key_size() * 2 + 2),
            values: GrowableBuffer::with_capacity(VALUE_BUFFER_SIZE),
            options,
            stats: LoadStats::default(),
        })
    }

    /// Loads every section until the input is exhausted.
    ///
    /// # Errors
    ///
    /// Stops at the first format violation, rejected write or failed
    /// commit. The open batch is discarded; earlier batches stay committed.
    pub fn run(mut self) -> LoadResult<LoadStats> {
        let result = self.load_sections();
        self.stats.lines = self.session.line;

        match result {
            Ok(()) => {
                info!(
                    sections = self.stats.sections,
                    records = self.stats.records,
                    duplicates = self.stats.duplicates,
                    batches = self.stats.batches,
                    lines = self.stats.lines,
                    "load complete"
                );
                Ok(self.stats)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    committed_batches = self.stats.batches,
                    "load aborted"
                );
                Err(err)
            }
        }
    }

    fn load_sections(&mut self) -> LoadResult<()> {
        loop {
            if self.session.framing
                && parse_header(&mut self.decoder, &mut self.session, &mut self.values)?.is_none()
            {
                return Ok(());
            }

            self.load_section()?;

            if !self.session.framing || self.session.eof {
                return Ok(());
            }
        }
    }

    fn load_section(&mut self) -> LoadResult<()> {
        let env = self.env;
        let mut txn = env
            .begin_write()
            .map_err(|err| self.session.store_error(err))?;
        let dbi = txn
            .open_database(self.session.database.as_deref(), self.session.flags)
            .map_err(|err| self.session.store_error(err))?;

        self.stats.sections += 1;
        info!(
            line = self.session.line,
            database = self.session.database.as_deref().unwrap_or("<main>"),
            flags = self.session.flags.bits(),
            "loading section"
        );

        loop {
            let end = self.load_batch(&mut txn, dbi)?;
            let id = txn
                .commit()
                .map_err(|err| self.session.store_error(err))?;
            self.stats.batches += 1;
            debug!(txn = %id, line = self.session.line, "batch committed");

            match end {
                BatchEnd::SectionDone => break,
                BatchEnd::Full => {
                    txn = env
                        .begin_write()
                        .map_err(|err| self.session.store_error(err))?;
                }
            }
        }

        env.close_database(dbi);
        Ok(())
    }

    /// Writes records until the batch is full or the section ends.
    fn load_batch(&mut self, txn: &mut WriteTxn<'env>, dbi: Dbi) -> LoadResult<BatchEnd> {
        let put_flags = if self.options.no_overwrite {
            PutFlags::NO_OVERWRITE
        } else {
            PutFlags::empty()
        };
        let mut cursor = txn
            .cursor(dbi)
            .map_err(|err| self.session.store_error(err))?;
        let mut applied = 0;

        while applied < self.options.batch_size {
            let key = match self.decoder.decode(&mut self.session, &mut self.keys)? {
                Decoded::Record(key) => key,
                Decoded::EndOfSection => return Ok(BatchEnd::SectionDone),
            };
            let value = match self.decoder.decode(&mut self.session, &mut self.values)? {
                Decoded::Record(value) => value,
                Decoded::EndOfSection => {
                    return Err(self.session.format_error(FormatError::UnpairedKey))
                }
            };

            match cursor.put(key, value, put_flags) {
                Ok(()) => {
                    applied += 1;
                    self.stats.records += 1;
                }
                Err(err) if err.is_key_exist() && self.options.no_overwrite => {
                    self.stats.duplicates += 1;
                    debug!(line = self.session.line, "skipping duplicate key");
                }
                Err(err) => return Err(self.session.store_error(err)),
            }
        }

        Ok(BatchEnd::Full)
    }
}

/// Loads `reader` into `env` with `options`.
///
/// # Errors
///
/// See [`BatchLoader::run`].
pub fn load<R: BufRead>(env: &Environment, reader: R, options: LoadOptions) -> LoadResult<LoadStats> {
    BatchLoader::new(env, reader, options)?.run()
}
