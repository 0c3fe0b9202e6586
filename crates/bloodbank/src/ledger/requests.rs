//! Blood request log.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::blood::BloodGroup;
use crate::validation::BloodRequestApplication;

/// How soon the requested blood is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Scheduled need.
    #[default]
    Normal,
    /// Needed within the day.
    Urgent,
    /// Needed immediately.
    Critical,
}

impl Urgency {
    /// All urgency levels, least urgent first.
    pub const ALL: [Self; 3] = [Self::Normal, Self::Urgent, Self::Critical];
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Urgent => write!(f, "urgent"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// The given text is not an urgency level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown urgency level: '{0}'")]
pub struct UnknownUrgency(pub String);

impl FromStr for Urgency {
    type Err = UnknownUrgency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.to_string().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownUrgency(s.to_string()))
    }
}

/// Lifecycle state of a request.
///
/// Requests are created pending and nothing moves them on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Accepted against stock, awaiting delivery.
    #[default]
    Pending,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// An accepted blood request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// Time-derived identifier.
    pub id: String,
    /// Patient who needs blood.
    pub patient_name: String,
    /// Person who filed the request.
    pub requester_name: String,
    /// Requester phone number.
    pub phone: String,
    /// Required blood group.
    pub blood_group: BloodGroup,
    /// Units withdrawn from inventory for this request.
    pub units_needed: u32,
    /// How soon the blood is needed.
    pub urgency: Urgency,
    /// Delivery address.
    pub hospital_address: String,
    /// Optional medical reason.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub medical_reason: Option<String>,
    /// When the request was accepted.
    #[serde(rename = "requestDate")]
    pub requested_at: DateTime<Utc>,
    /// Current status.
    pub status: RequestStatus,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let reason = Option::<String>::deserialize(deserializer)?;
    Ok(reason.filter(|r| !r.trim().is_empty()))
}

impl RequestRecord {
    pub(crate) fn from_application(
        id: String,
        application: BloodRequestApplication,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            patient_name: application.patient_name().to_string(),
            requester_name: application.requester_name().to_string(),
            phone: application.phone().to_string(),
            blood_group: application.blood_group(),
            units_needed: application.units_needed(),
            urgency: application.urgency(),
            hospital_address: application.hospital_address().to_string(),
            medical_reason: application.medical_reason().map(str::to_string),
            requested_at,
            status: RequestStatus::Pending,
        }
    }
}

/// Append-only list of accepted requests in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestLog {
    requests: Vec<RequestRecord>,
}

impl RequestLog {
    /// Create a log from previously stored records.
    #[must_use]
    pub fn from_records(requests: Vec<RequestRecord>) -> Self {
        Self { requests }
    }

    /// Number of accepted requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether no request has been accepted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Requests in submission order.
    pub fn iter(&self) -> std::slice::Iter<'_, RequestRecord> {
        self.requests.iter()
    }

    /// Most recently accepted request.
    #[must_use]
    pub fn latest(&self) -> Option<&RequestRecord> {
        self.requests.last()
    }

    pub(crate) fn push(&mut self, request: RequestRecord) {
        self.requests.push(request);
    }
}

impl<'a> IntoIterator for &'a RequestLog {
    type Item = &'a RequestRecord;
    type IntoIter = std::slice::Iter<'a, RequestRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORED: &str = r#"[{
        "patientName": "Alan Turing",
        "requesterName": "Joan Clarke",
        "phone": "+441234567890",
        "bloodGroup": "AB+",
        "unitsNeeded": 2,
        "urgency": "critical",
        "hospitalAddress": "Addenbrooke's Hospital, Cambridge",
        "medicalReason": "",
        "requestDate": "2024-06-07T09:00:00.000Z",
        "id": "1717750800000",
        "status": "pending"
    }]"#;

    #[test]
    fn test_urgency_parse() {
        assert_eq!("urgent".parse::<Urgency>(), Ok(Urgency::Urgent));
        assert_eq!(" CRITICAL ".parse::<Urgency>(), Ok(Urgency::Critical));
        assert_eq!("Normal".parse::<Urgency>(), Ok(Urgency::Normal));
        assert!("".parse::<Urgency>().is_err());
        assert!("asap".parse::<Urgency>().is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(RequestStatus::Pending.to_string(), "pending");
        assert_eq!(RequestStatus::default(), RequestStatus::Pending);
    }

    #[test]
    fn test_reads_stored_payload() {
        let log: RequestLog = serde_json::from_str(STORED).unwrap();
        let request = log.latest().unwrap();
        assert_eq!(request.blood_group, BloodGroup::AbPositive);
        assert_eq!(request.urgency, Urgency::Critical);
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.medical_reason, None);
        assert_eq!(request.units_needed, 2);
    }

    #[test]
    fn test_missing_medical_reason_is_none() {
        let json = STORED.replace(r#""medicalReason": "","#, "");
        let log: RequestLog = serde_json::from_str(&json).unwrap();
        assert_eq!(log.latest().unwrap().medical_reason, None);
    }

    #[test]
    fn test_writes_camel_case_field_names() {
        let log: RequestLog = serde_json::from_str(STORED).unwrap();
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json[0]["unitsNeeded"], 2);
        assert_eq!(json[0]["status"], "pending");
        assert!(json[0].get("medicalReason").is_none());
        assert!(json[0].get("requestDate").is_some());
    }
}
