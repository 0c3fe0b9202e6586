//! Form validation.
//!
//! Raw forms carry the strings a user typed. Validating a form yields a typed
//! application that ledger operations accept, or every rule the form broke.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::blood::BloodGroup;
use crate::ledger::Urgency;

const MIN_NAME_LEN: usize = 2;
const MIN_ADDRESS_LEN: usize = 10;

/// Inclusive donor age range in years.
pub const DONOR_AGE_RANGE: std::ops::RangeInclusive<u32> = 18..=65;

/// Minimum donor weight in kilograms.
pub const MIN_DONOR_WEIGHT: u32 = 50;

/// Inclusive range of units a single request may ask for.
pub const UNITS_PER_REQUEST: std::ops::RangeInclusive<u32> = 1..=10;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex pattern"))
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^[+]?[1-9][0-9]{0,15}$").expect("Invalid regex pattern"))
}

/// A single rule violation on a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The offending field, e.g. `units_needed`.
    pub field: &'static str,
    /// Message suitable for showing next to the field.
    pub message: &'static str,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found on one form, in field order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// The individual violations.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The violation reported for `field`, if any.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field == field)
    }

    /// Iterate over the violations.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Accumulates violations so a form reports all of them at once.
#[derive(Debug, Default)]
struct Violations(Vec<ValidationError>);

impl Violations {
    fn check(&mut self, ok: bool, field: &'static str, message: &'static str) {
        if !ok {
            trace!(field, message, "form field rejected");
            self.0.push(ValidationError { field, message });
        }
    }

    /// Pass `value` through, recording a violation when it is absent.
    fn require<T>(
        &mut self,
        value: Option<T>,
        field: &'static str,
        message: &'static str,
    ) -> Option<T> {
        self.check(value.is_some(), field, message);
        value
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_errors(self) -> ValidationErrors {
        ValidationErrors(self.0)
    }
}

fn long_enough(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

fn valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    phone_regex().is_match(&compact)
}

fn parse_number(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

/// Donor registration form, exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DonorForm {
    /// Full name.
    pub name: String,
    /// Contact email; must be unique across the registry.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Age in years.
    pub age: String,
    /// Blood group label.
    pub blood_group: String,
    /// Weight in kilograms.
    pub weight: String,
    /// Postal address.
    pub address: String,
    /// Whether the donor accepted the terms and conditions.
    pub terms_accepted: bool,
}

/// A donor form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorApplication {
    name: String,
    email: String,
    phone: String,
    age: u32,
    blood_group: BloodGroup,
    weight: u32,
    address: String,
}

impl DonorApplication {
    /// Trimmed donor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed email, compared case-sensitively for uniqueness.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Trimmed phone number as entered.
    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Age in years.
    #[must_use]
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Chosen blood group.
    #[must_use]
    pub fn blood_group(&self) -> BloodGroup {
        self.blood_group
    }

    /// Weight in kilograms.
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Trimmed postal address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl DonorForm {
    /// Validate every field, collecting all violations.
    ///
    /// # Errors
    ///
    /// Returns every broken rule if any field is invalid.
    pub fn validate(&self) -> Result<DonorApplication, ValidationErrors> {
        let mut v = Violations::default();

        let name = self.name.trim();
        v.check(
            long_enough(name, MIN_NAME_LEN),
            "name",
            "Name must be at least 2 characters",
        );

        let email = self.email.trim();
        v.check(
            email_regex().is_match(email),
            "email",
            "Please enter a valid email address",
        );

        let phone = self.phone.trim();
        v.check(
            valid_phone(phone),
            "phone",
            "Please enter a valid phone number",
        );

        let age = v.require(
            parse_number(&self.age).filter(|age| DONOR_AGE_RANGE.contains(age)),
            "age",
            "Age must be between 18 and 65",
        );

        let blood_group = v.require(
            self.blood_group.parse::<BloodGroup>().ok(),
            "blood_group",
            "Please select a blood group",
        );

        let weight = v.require(
            parse_number(&self.weight).filter(|w| *w >= MIN_DONOR_WEIGHT),
            "weight",
            "Weight must be at least 50 kg",
        );

        let address = self.address.trim();
        v.check(
            long_enough(address, MIN_ADDRESS_LEN),
            "address",
            "Please provide a complete address",
        );

        v.check(
            self.terms_accepted,
            "terms",
            "You must agree to the terms and conditions",
        );

        match (age, blood_group, weight) {
            (Some(age), Some(blood_group), Some(weight)) if v.is_empty() => Ok(DonorApplication {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                age,
                blood_group,
                weight,
                address: address.to_string(),
            }),
            _ => Err(v.into_errors()),
        }
    }
}

/// Blood request form, exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestForm {
    /// Name of the patient who needs blood.
    pub patient_name: String,
    /// Name of the person filing the request.
    pub requester_name: String,
    /// Requester phone number.
    pub phone: String,
    /// Required blood group label.
    pub blood_group: String,
    /// Number of units requested.
    pub units_needed: String,
    /// Urgency level.
    pub urgency: String,
    /// Hospital address for delivery.
    pub hospital_address: String,
    /// Optional free-text medical reason.
    pub medical_reason: String,
}

/// A request form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloodRequestApplication {
    patient_name: String,
    requester_name: String,
    phone: String,
    blood_group: BloodGroup,
    units_needed: u32,
    urgency: Urgency,
    hospital_address: String,
    medical_reason: Option<String>,
}

impl BloodRequestApplication {
    /// Trimmed patient name.
    #[must_use]
    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    /// Trimmed requester name.
    #[must_use]
    pub fn requester_name(&self) -> &str {
        &self.requester_name
    }

    /// Trimmed phone number as entered.
    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Required blood group.
    #[must_use]
    pub fn blood_group(&self) -> BloodGroup {
        self.blood_group
    }

    /// Units requested, within [`UNITS_PER_REQUEST`].
    #[must_use]
    pub fn units_needed(&self) -> u32 {
        self.units_needed
    }

    /// Urgency level.
    #[must_use]
    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    /// Trimmed hospital address.
    #[must_use]
    pub fn hospital_address(&self) -> &str {
        &self.hospital_address
    }

    /// Medical reason, `None` when left blank.
    #[must_use]
    pub fn medical_reason(&self) -> Option<&str> {
        self.medical_reason.as_deref()
    }
}

impl RequestForm {
    /// Validate every field, collecting all violations.
    ///
    /// # Errors
    ///
    /// Returns every broken rule if any field is invalid.
    pub fn validate(&self) -> Result<BloodRequestApplication, ValidationErrors> {
        let mut v = Violations::default();

        let patient_name = self.patient_name.trim();
        v.check(
            long_enough(patient_name, MIN_NAME_LEN),
            "patient_name",
            "Patient name is required",
        );

        let requester_name = self.requester_name.trim();
        v.check(
            long_enough(requester_name, MIN_NAME_LEN),
            "requester_name",
            "Requester name is required",
        );

        let phone = self.phone.trim();
        v.check(
            valid_phone(phone),
            "phone",
            "Please enter a valid phone number",
        );

        let blood_group = v.require(
            self.blood_group.parse::<BloodGroup>().ok(),
            "blood_group",
            "Please select required blood group",
        );

        let units_needed = v.require(
            parse_number(&self.units_needed).filter(|units| UNITS_PER_REQUEST.contains(units)),
            "units_needed",
            "Units needed must be between 1 and 10",
        );

        let urgency = v.require(
            self.urgency.parse::<Urgency>().ok(),
            "urgency",
            "Please select urgency level",
        );

        let hospital_address = self.hospital_address.trim();
        v.check(
            long_enough(hospital_address, MIN_ADDRESS_LEN),
            "hospital_address",
            "Please provide complete hospital address",
        );

        let medical_reason = Some(self.medical_reason.trim())
            .filter(|reason| !reason.is_empty())
            .map(str::to_string);

        match (blood_group, units_needed, urgency) {
            (Some(blood_group), Some(units_needed), Some(urgency)) if v.is_empty() => {
                Ok(BloodRequestApplication {
                    patient_name: patient_name.to_string(),
                    requester_name: requester_name.to_string(),
                    phone: phone.to_string(),
                    blood_group,
                    units_needed,
                    urgency,
                    hospital_address: hospital_address.to_string(),
                    medical_reason,
                })
            }
            _ => Err(v.into_errors()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn donor_form(email: &str, blood_group: &str) -> DonorForm {
        DonorForm {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            phone: "+15551234567".to_string(),
            age: "36".to_string(),
            blood_group: blood_group.to_string(),
            weight: "58".to_string(),
            address: "12 St James's Square, London".to_string(),
            terms_accepted: true,
        }
    }

    pub(crate) fn request_form(blood_group: &str, units: u32) -> RequestForm {
        RequestForm {
            patient_name: "Charles Babbage".to_string(),
            requester_name: "Ada Lovelace".to_string(),
            phone: "555 123 4567".to_string(),
            blood_group: blood_group.to_string(),
            units_needed: units.to_string(),
            urgency: "urgent".to_string(),
            hospital_address: "St Thomas' Hospital, Westminster".to_string(),
            medical_reason: String::new(),
        }
    }

    #[test]
    fn test_valid_donor_form() {
        let app = donor_form(" ada@example.com ", "AB-").validate().unwrap();
        assert_eq!(app.name(), "Ada Lovelace");
        assert_eq!(app.email(), "ada@example.com");
        assert_eq!(app.age(), 36);
        assert_eq!(app.weight(), 58);
        assert_eq!(app.blood_group(), BloodGroup::AbNegative);
    }

    #[test]
    fn test_empty_donor_form_reports_every_field() {
        let errors = DonorForm::default().validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            [
                "name",
                "email",
                "phone",
                "age",
                "blood_group",
                "weight",
                "address",
                "terms"
            ]
        );
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_donor_age_bounds() {
        let mut form = donor_form("a@b.co", "O+");
        for (age, ok) in [("17", false), ("18", true), ("65", true), ("66", false)] {
            form.age = age.to_string();
            assert_eq!(form.validate().is_ok(), ok, "age {age}");
        }
        form.age = "forty".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.for_field("age").unwrap().message,
            "Age must be between 18 and 65"
        );
    }

    #[test]
    fn test_donor_weight_minimum() {
        let mut form = donor_form("a@b.co", "O+");
        form.weight = "49".to_string();
        assert!(form.validate().unwrap_err().for_field("weight").is_some());
        form.weight = "50".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_email_pattern() {
        let mut form = donor_form("a@b.co", "O+");
        for bad in ["plain", "a@b", "a b@c.de", "@c.de", "a@@c.de"] {
            form.email = bad.to_string();
            assert!(
                form.validate().unwrap_err().for_field("email").is_some(),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_phone_pattern_ignores_spaces() {
        assert!(valid_phone("+1 555 123 4567"));
        assert!(valid_phone("5551234567"));
        assert!(!valid_phone("0551234567"));
        assert!(!valid_phone("+12345678901234567"));
        assert!(!valid_phone("555-123"));
        assert!(!valid_phone(""));
    }

    #[test]
    fn test_phone_pattern_rejects_non_ascii_digits() {
        // Arabic-Indic and fullwidth digits are Unicode decimals, not phone digits.
        assert!(!valid_phone("+1\u{662}\u{663}\u{664}\u{665}\u{666}\u{667}\u{668}\u{669}"));
        assert!(!valid_phone("\u{ff15}\u{ff15}\u{ff15}1234567"));

        let mut form = donor_form("ada@example.com", "O+");
        form.phone = "+1\u{662}\u{663}\u{664}\u{665}\u{666}\u{667}\u{668}\u{669}".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.for_field("phone").is_some());

        let mut request = request_form("A+", 2);
        request.phone = "\u{ff15}\u{ff15}\u{ff15}1234567".to_string();
        assert!(request.validate().unwrap_err().for_field("phone").is_some());
    }

    #[test]
    fn test_each_invalid_typed_field_is_reported_alone() {
        let mut form = donor_form("ada@example.com", "O+");
        form.blood_group = "C+".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.for_field("blood_group").unwrap().message, "Please select a blood group");

        let mut request = request_form("O+", 3);
        request.urgency = "whenever".to_string();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.for_field("urgency").is_some());
    }

    #[test]
    fn test_short_address_and_missing_terms() {
        let mut form = donor_form("a@b.co", "O+");
        form.address = "  Flat 1  ".to_string();
        form.terms_accepted = false;
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "address: Please provide a complete address; \
             terms: You must agree to the terms and conditions"
        );
    }

    #[test]
    fn test_valid_request_form() {
        let mut form = request_form("B+", 3);
        form.medical_reason = "  surgery ".to_string();
        let app = form.validate().unwrap();
        assert_eq!(app.blood_group(), BloodGroup::BPositive);
        assert_eq!(app.units_needed(), 3);
        assert_eq!(app.urgency(), Urgency::Urgent);
        assert_eq!(app.phone(), "555 123 4567");
        assert_eq!(app.medical_reason(), Some("surgery"));
    }

    #[test]
    fn test_blank_medical_reason_is_none() {
        let app = request_form("B+", 1).validate().unwrap();
        assert_eq!(app.medical_reason(), None);
    }

    #[test]
    fn test_request_units_bounds() {
        let mut form = request_form("A-", 1);
        for (units, ok) in [("0", false), ("1", true), ("10", true), ("11", false), ("", false)] {
            form.units_needed = units.to_string();
            assert_eq!(form.validate().is_ok(), ok, "units {units:?}");
        }
    }

    #[test]
    fn test_empty_request_form_reports_every_required_field() {
        let errors = RequestForm::default().validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            [
                "patient_name",
                "requester_name",
                "phone",
                "blood_group",
                "units_needed",
                "urgency",
                "hospital_address"
            ]
        );
        assert_eq!(
            errors.for_field("blood_group").unwrap().message,
            "Please select required blood group"
        );
    }

    #[test]
    fn test_validation_errors_serialize_as_list() {
        let mut form = request_form("A+", 2);
        form.urgency = "whenever".to_string();
        let errors = form.validate().unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"field": "urgency", "message": "Please select urgency level"}])
        );
    }
}
