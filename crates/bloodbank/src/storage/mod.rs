//! Storage layer for bloodbank.
//!
//! Ledger state is persisted as three JSON slots (`donors`, `requests`,
//! `bloodInventory`) in a `SQLite` key-value table. Loading tolerates missing
//! and unreadable slots; committing writes every pending slot in one
//! transaction.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ledger::{DonorRegistry, InventoryTable, Ledger, LedgerOptions, RequestLog, Slot};

/// Key-value store holding serialized ledger slots.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn read_slot(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn write_slot(&self, key: &str, value: &str) -> Result<()> {
        upsert(&self.conn, key, value)
    }

    /// Load the ledger, seeding missing state with the thread RNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails. Unreadable slot
    /// payloads are not errors.
    pub fn load_ledger(&self, options: &LedgerOptions) -> Result<Ledger> {
        self.load_ledger_with_rng(options, &mut rand::thread_rng())
    }

    /// Load the ledger, drawing any inventory seed from `rng`.
    ///
    /// Missing slots fall back to an empty registry and log and a freshly
    /// seeded inventory. A slot whose payload cannot be parsed is copied to
    /// its [`Slot::corrupt_key`] and treated as missing. Seeded inventory and
    /// sample donors are committed before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_ledger_with_rng<R: Rng>(
        &self,
        options: &LedgerOptions,
        rng: &mut R,
    ) -> Result<Ledger> {
        let donors = self.load_slot::<DonorRegistry>(Slot::Donors)?;
        let requests = self.load_slot::<RequestLog>(Slot::Requests)?;
        let inventory = self.load_slot::<InventoryTable>(Slot::Inventory)?;

        let seed_donors =
            options.sample_donors && donors.as_ref().map_or(true, DonorRegistry::is_empty);
        let donors = if seed_donors {
            info!("Seeding registry with sample donors");
            DonorRegistry::with_samples(Utc::now())
        } else {
            donors.unwrap_or_default()
        };

        let seed_inventory = inventory.is_none();
        let inventory = inventory.unwrap_or_else(|| {
            info!(
                min = options.seed_range.start(),
                max = options.seed_range.end(),
                "Seeding blood inventory"
            );
            InventoryTable::seeded(rng, options.seed_range.clone())
        });

        let mut ledger = Ledger::new(donors, inventory, requests.unwrap_or_default());
        if seed_donors {
            ledger.mark_pending(Slot::Donors);
        }
        if seed_inventory {
            ledger.mark_pending(Slot::Inventory);
        }
        self.commit(&mut ledger)?;

        debug!(
            donors = ledger.donors().len(),
            requests = ledger.requests().len(),
            units = ledger.inventory().total(),
            "Ledger loaded"
        );
        Ok(ledger)
    }

    /// Write every pending slot of `ledger` in one transaction.
    ///
    /// Returns the number of slots written. The ledger's pending set is
    /// cleared only once the transaction commits.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn commit(&self, ledger: &mut Ledger) -> Result<usize> {
        let pending: Vec<Slot> = ledger.pending_slots().collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        for slot in &pending {
            let payload = ledger.slot_payload(*slot)?;
            upsert(&tx, slot.key(), &payload)?;
            debug!(slot = slot.key(), bytes = payload.len(), "Wrote slot");
        }
        tx.commit()?;

        ledger.clear_pending();
        Ok(pending.len())
    }

    fn load_slot<T: DeserializeOwned>(&self, slot: Slot) -> Result<Option<T>> {
        let Some(raw) = self.read_slot(slot.key())? else {
            debug!(slot = slot.key(), "Slot absent, using default");
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    slot = slot.key(),
                    error = %e,
                    backup = %slot.corrupt_key(),
                    "Unreadable slot payload, falling back to default"
                );
                self.write_slot(&slot.corrupt_key(), &raw)?;
                Ok(None)
            }
        }
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        schema::UPSERT_SLOT,
        params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}
