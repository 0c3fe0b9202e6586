//! `bloodbank` - A ledger of blood donors, stock and requests
//!
//! This library validates donor registrations and blood requests, keeps the
//! per-group unit inventory consistent with them, and persists the result to
//! a `SQLite` key-value store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod blood;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod storage;
pub mod validation;

pub use blood::{BloodGroup, StockLevel};
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{
    AdjustError, DonorRecord, DonorRegistry, InsufficientStock, InventoryTable, Ledger,
    LedgerError, LedgerOptions, LedgerStats, RequestLog, RequestRecord, RequestStatus, Slot,
    StockEntry, StockOverflow, Urgency,
};
pub use logging::init_logging;
pub use storage::Storage;
pub use validation::{DonorForm, RequestForm, ValidationError, ValidationErrors};
