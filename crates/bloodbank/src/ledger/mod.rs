//! The blood-bank ledger.
//!
//! A [`Ledger`] owns the donor registry, the inventory table and the request
//! log, and is the only thing that mutates them. Mutations mark the affected
//! [`Slot`]s as pending; nothing reaches storage until the caller commits with
//! [`crate::Storage::commit`].
//!
//! # Example
//!
//! ```
//! use bloodbank::{BloodGroup, InventoryTable, Ledger, RequestForm};
//!
//! let inventory = InventoryTable::from_counts([(BloodGroup::OPositive, 10)]);
//! let mut ledger = Ledger::new(Default::default(), inventory, Default::default());
//!
//! let form = RequestForm {
//!     patient_name: "Ada".into(),
//!     requester_name: "Charles".into(),
//!     phone: "+15551234567".into(),
//!     blood_group: "O+".into(),
//!     units_needed: "10".into(),
//!     urgency: "urgent".into(),
//!     hospital_address: "1 Hospital Road, Springfield".into(),
//!     medical_reason: String::new(),
//! };
//!
//! ledger.submit_request(&form).unwrap();
//! assert_eq!(ledger.inventory().get(BloodGroup::OPositive), 0);
//! assert!(ledger.submit_request(&form).is_err());
//! ```

mod donors;
mod inventory;
mod requests;

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub use donors::{DonorRecord, DonorRegistry};
pub use inventory::{AdjustError, InsufficientStock, InventoryTable, StockEntry, StockOverflow};
pub use requests::{RequestLog, RequestRecord, RequestStatus, UnknownUrgency, Urgency};

use crate::validation::{
    BloodRequestApplication, DonorApplication, DonorForm, RequestForm, ValidationErrors,
};

/// Errors a user can correct and resubmit.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// One or more form fields are invalid.
    #[error("invalid form: {0}")]
    Validation(#[from] ValidationErrors),

    /// A donor with this email is already registered.
    #[error("email already registered: {email}")]
    DuplicateEmail {
        /// The conflicting email.
        email: String,
    },

    /// Not enough stock to accept the request.
    #[error(transparent)]
    InsufficientStock(#[from] InsufficientStock),

    /// The group already holds as many units as can be recorded.
    #[error(transparent)]
    StockOverflow(#[from] StockOverflow),
}

impl From<AdjustError> for LedgerError {
    fn from(err: AdjustError) -> Self {
        match err {
            AdjustError::Insufficient(shortage) => shortage.into(),
            AdjustError::Overflow(overflow) => overflow.into(),
        }
    }
}

impl LedgerError {
    /// The field violations, if this is a validation failure.
    #[must_use]
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Check if this error is a duplicate-email rejection.
    #[must_use]
    pub fn is_duplicate_email(&self) -> bool {
        matches!(self, Self::DuplicateEmail { .. })
    }

    /// Check if this error is an insufficient-stock rejection.
    #[must_use]
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, Self::InsufficientStock(_))
    }
}

/// A named unit of persisted ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// The donor registry.
    Donors,
    /// The request log.
    Requests,
    /// The inventory table.
    Inventory,
}

impl Slot {
    /// All slots.
    pub const ALL: [Self; 3] = [Self::Donors, Self::Requests, Self::Inventory];

    /// Storage key of this slot.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Donors => "donors",
            Self::Requests => "requests",
            Self::Inventory => "bloodInventory",
        }
    }

    /// Storage key under which an unreadable payload of this slot is kept.
    #[must_use]
    pub fn corrupt_key(self) -> String {
        format!("{}.corrupt", self.key())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How a ledger is initialized when storage holds no state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOptions {
    /// Range each blood group's initial unit count is drawn from.
    pub seed_range: RangeInclusive<u32>,
    /// Seed an empty registry with demonstration donors.
    pub sample_donors: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            seed_range: 10..=90,
            sample_donors: false,
        }
    }
}

/// Headline counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Registered donors.
    pub total_donors: usize,
    /// Units across all blood groups.
    pub total_units: u64,
    /// Accepted requests.
    pub total_requests: usize,
}

/// Donor, inventory and request state with its mutating operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    donors: DonorRegistry,
    inventory: InventoryTable,
    requests: RequestLog,
    pending: BTreeSet<Slot>,
    last_id: i64,
}

impl Ledger {
    /// Assemble a ledger from its collections. Nothing is pending.
    #[must_use]
    pub fn new(donors: DonorRegistry, inventory: InventoryTable, requests: RequestLog) -> Self {
        let last_id = donors
            .iter()
            .map(|d| d.id.as_str())
            .chain(requests.iter().map(|r| r.id.as_str()))
            .filter_map(|id| id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            donors,
            inventory,
            requests,
            pending: BTreeSet::new(),
            last_id,
        }
    }

    /// The donor registry.
    #[must_use]
    pub fn donors(&self) -> &DonorRegistry {
        &self.donors
    }

    /// The inventory table.
    #[must_use]
    pub fn inventory(&self) -> &InventoryTable {
        &self.inventory
    }

    /// The request log.
    #[must_use]
    pub fn requests(&self) -> &RequestLog {
        &self.requests
    }

    /// Headline counters.
    #[must_use]
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            total_donors: self.donors.len(),
            total_units: self.inventory.total(),
            total_requests: self.requests.len(),
        }
    }

    /// Validate a donor form and register the donor.
    ///
    /// A successful registration adds one unit of the donor's blood group.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] listing every invalid field,
    /// [`LedgerError::DuplicateEmail`] if the email is taken, or
    /// [`LedgerError::StockOverflow`] if the group cannot take another unit.
    /// The ledger is unchanged on error.
    pub fn register_donor(&mut self, form: &DonorForm) -> Result<DonorRecord, LedgerError> {
        let application = form.validate()?;
        self.register_validated_donor(application)
    }

    /// Register a donor whose form has already been validated.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateEmail`] if the email is taken, or
    /// [`LedgerError::StockOverflow`] if the group cannot take another unit.
    pub fn register_validated_donor(
        &mut self,
        application: DonorApplication,
    ) -> Result<DonorRecord, LedgerError> {
        if self.donors.find_by_email(application.email()).is_some() {
            debug!(email = application.email(), "rejected duplicate donor email");
            return Err(LedgerError::DuplicateEmail {
                email: application.email().to_string(),
            });
        }

        self.inventory.adjust(application.blood_group(), 1)?;

        let now = Utc::now();
        let id = self.next_id(now);
        let donor = DonorRecord::from_application(id, application, now);
        self.donors.push(donor.clone());
        self.pending.insert(Slot::Donors);
        self.pending.insert(Slot::Inventory);

        info!(id = %donor.id, blood_group = %donor.blood_group, "donor registered");
        Ok(donor)
    }

    /// Validate a request form and accept it against stock.
    ///
    /// Acceptance withdraws the requested units and logs the request as
    /// pending.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] listing every invalid field, or
    /// [`LedgerError::InsufficientStock`] if the group cannot cover the
    /// request. The ledger is unchanged on error.
    pub fn submit_request(&mut self, form: &RequestForm) -> Result<RequestRecord, LedgerError> {
        let application = form.validate()?;
        self.submit_validated_request(application)
    }

    /// Accept a request whose form has already been validated.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientStock`] if the group cannot cover
    /// the request.
    pub fn submit_validated_request(
        &mut self,
        application: BloodRequestApplication,
    ) -> Result<RequestRecord, LedgerError> {
        let group = application.blood_group();
        let units = application.units_needed();
        if let Err(shortage) = self.inventory.ensure_available(group, units) {
            debug!(%group, available = shortage.available, requested = units, "request exceeds stock");
            return Err(shortage.into());
        }

        self.inventory.adjust(group, -i64::from(units))?;

        let now = Utc::now();
        let id = self.next_id(now);
        let request = RequestRecord::from_application(id, application, now);
        self.requests.push(request.clone());
        self.pending.insert(Slot::Requests);
        self.pending.insert(Slot::Inventory);

        info!(id = %request.id, %group, units, "blood request accepted");
        Ok(request)
    }

    /// Slots changed since the last commit.
    pub fn pending_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.pending.iter().copied()
    }

    /// Whether any change awaits commit.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Serialized payload of `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn slot_payload(&self, slot: Slot) -> serde_json::Result<String> {
        match slot {
            Slot::Donors => serde_json::to_string(&self.donors),
            Slot::Requests => serde_json::to_string(&self.requests),
            Slot::Inventory => serde_json::to_string(&self.inventory),
        }
    }

    pub(crate) fn mark_pending(&mut self, slot: Slot) {
        self.pending.insert(slot);
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Millisecond timestamp, bumped past the previous id when the clock
    /// hasn't moved on.
    fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let id = now.timestamp_millis().max(self.last_id.saturating_add(1));
        self.last_id = id;
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blood::BloodGroup;
    use crate::validation::tests::{donor_form, request_form};

    fn ledger_with(counts: impl IntoIterator<Item = (BloodGroup, u32)>) -> Ledger {
        Ledger::new(
            DonorRegistry::default(),
            InventoryTable::from_counts(counts),
            RequestLog::default(),
        )
    }

    #[test]
    fn test_register_donor_adds_record_and_unit() {
        let mut ledger = ledger_with([(BloodGroup::AbNegative, 7)]);

        let donor = ledger
            .register_donor(&donor_form("ada@example.com", "AB-"))
            .unwrap();

        assert_eq!(donor.email, "ada@example.com");
        assert!(donor.terms_accepted);
        assert_eq!(ledger.donors().len(), 1);
        assert_eq!(ledger.inventory().get(BloodGroup::AbNegative), 8);
        assert_eq!(
            ledger.pending_slots().collect::<Vec<_>>(),
            [Slot::Donors, Slot::Inventory]
        );
    }

    #[test]
    fn test_register_duplicate_email_changes_nothing() {
        let mut ledger = ledger_with([(BloodGroup::OPositive, 20)]);
        ledger
            .register_donor(&donor_form("ada@example.com", "O+"))
            .unwrap();
        ledger.clear_pending();
        let before = ledger.clone();

        let err = ledger
            .register_donor(&donor_form("ada@example.com", "O+"))
            .unwrap_err();

        assert!(err.is_duplicate_email());
        assert_eq!(err.to_string(), "email already registered: ada@example.com");
        assert_eq!(ledger, before);
        assert!(!ledger.has_pending());
    }

    #[test]
    fn test_duplicate_email_is_case_sensitive() {
        let mut ledger = ledger_with([]);
        ledger
            .register_donor(&donor_form("ada@example.com", "O+"))
            .unwrap();
        assert!(ledger
            .register_donor(&donor_form("ADA@example.com", "O+"))
            .is_ok());
    }

    #[test]
    fn test_invalid_donor_form_reports_all_fields() {
        let mut ledger = ledger_with([]);
        let mut form = donor_form("not-an-email", "O+");
        form.age = "12".to_string();

        let err = ledger.register_donor(&form).unwrap_err();

        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors.for_field("email").is_some());
        assert!(errors.for_field("age").is_some());
        assert!(ledger.donors().is_empty());
        assert_eq!(ledger.inventory().total(), 0);
    }

    #[test]
    fn test_validation_runs_before_duplicate_check() {
        let mut ledger = ledger_with([]);
        ledger
            .register_donor(&donor_form("ada@example.com", "O+"))
            .unwrap();
        let mut form = donor_form("ada@example.com", "O+");
        form.terms_accepted = false;

        let err = ledger.register_donor(&form).unwrap_err();
        assert!(err.validation_errors().is_some());
    }

    #[test]
    fn test_register_donor_at_capacity_changes_nothing() {
        let mut ledger = ledger_with([(BloodGroup::AbPositive, u32::MAX)]);
        let before = ledger.clone();

        let err = ledger
            .register_donor(&donor_form("ada@example.com", "AB+"))
            .unwrap_err();

        match err {
            LedgerError::StockOverflow(overflow) => {
                assert_eq!(overflow.blood_group, BloodGroup::AbPositive);
                assert_eq!(overflow.available, u32::MAX);
                assert_eq!(overflow.added, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger, before);
        assert!(ledger.donors().is_empty());
        assert!(!ledger.has_pending());
    }

    #[test]
    fn test_submit_request_drains_stock_then_fails() {
        let mut ledger = ledger_with([(BloodGroup::OPositive, 10)]);

        let request = ledger.submit_request(&request_form("O+", 10)).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.units_needed, 10);
        assert_eq!(ledger.inventory().get(BloodGroup::OPositive), 0);
        assert_eq!(ledger.requests().len(), 1);

        let err = ledger.submit_request(&request_form("O+", 10)).unwrap_err();
        match err {
            LedgerError::InsufficientStock(shortage) => {
                assert_eq!(shortage.blood_group, BloodGroup::OPositive);
                assert_eq!(shortage.available, 0);
                assert_eq!(shortage.requested, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger.requests().len(), 1);
    }

    #[test]
    fn test_insufficient_stock_changes_nothing() {
        let mut ledger = ledger_with([(BloodGroup::BNegative, 2)]);
        let before = ledger.clone();

        let err = ledger.submit_request(&request_form("B-", 3)).unwrap_err();

        assert!(err.is_insufficient_stock());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_invalid_request_form_changes_nothing() {
        let mut ledger = ledger_with([(BloodGroup::APositive, 50)]);
        let before = ledger.clone();

        let err = ledger.submit_request(&request_form("A+", 11)).unwrap_err();

        assert_eq!(
            err.validation_errors()
                .unwrap()
                .for_field("units_needed")
                .unwrap()
                .message,
            "Units needed must be between 1 and 10"
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut ledger = ledger_with([(BloodGroup::OPositive, 100)]);
        let mut ids = Vec::new();
        for i in 0..5 {
            let donor = ledger
                .register_donor(&donor_form(&format!("donor{i}@example.com"), "O+"))
                .unwrap();
            ids.push(donor.id.parse::<i64>().unwrap());
            let request = ledger.submit_request(&request_form("O+", 1)).unwrap();
            ids.push(request.id.parse::<i64>().unwrap());
        }
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "{ids:?}");
    }

    #[test]
    fn test_ids_resume_after_loaded_records() {
        let future = Utc::now().timestamp_millis() + 60_000;
        let mut donors = DonorRegistry::with_samples(Utc::now());
        let mut record = donors.latest().unwrap().clone();
        record.id = future.to_string();
        record.email = "later@example.com".to_string();
        donors.push(record);

        let mut ledger = Ledger::new(donors, InventoryTable::empty(), RequestLog::default());
        let donor = ledger
            .register_donor(&donor_form("new@example.com", "A+"))
            .unwrap();
        assert_eq!(donor.id, (future + 1).to_string());
    }

    #[test]
    fn test_stats() {
        let mut ledger = ledger_with([(BloodGroup::APositive, 5), (BloodGroup::ONegative, 5)]);
        ledger
            .register_donor(&donor_form("ada@example.com", "O-"))
            .unwrap();
        ledger.submit_request(&request_form("A+", 2)).unwrap();

        assert_eq!(
            ledger.stats(),
            LedgerStats {
                total_donors: 1,
                total_units: 9,
                total_requests: 1,
            }
        );
    }

    #[test]
    fn test_slot_keys() {
        assert_eq!(Slot::Donors.key(), "donors");
        assert_eq!(Slot::Requests.key(), "requests");
        assert_eq!(Slot::Inventory.key(), "bloodInventory");
        assert_eq!(Slot::Inventory.corrupt_key(), "bloodInventory.corrupt");
    }

    #[test]
    fn test_slot_payload_matches_collections() {
        let mut ledger = ledger_with([(BloodGroup::OPositive, 3)]);
        ledger.submit_request(&request_form("O+", 1)).unwrap();

        let inventory: InventoryTable =
            serde_json::from_str(&ledger.slot_payload(Slot::Inventory).unwrap()).unwrap();
        let requests: RequestLog =
            serde_json::from_str(&ledger.slot_payload(Slot::Requests).unwrap()).unwrap();

        assert_eq!(&inventory, ledger.inventory());
        assert_eq!(&requests, ledger.requests());
    }

    #[test]
    fn test_default_options() {
        let options = LedgerOptions::default();
        assert_eq!(options.seed_range, 10..=90);
        assert!(!options.sample_donors);
    }
}
