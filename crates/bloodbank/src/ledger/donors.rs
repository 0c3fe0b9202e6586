//! Donor registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blood::BloodGroup;
use crate::validation::DonorApplication;

/// A registered donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorRecord {
    /// Time-derived identifier.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Contact email, unique across the registry.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Age in years at registration.
    pub age: u32,
    /// Blood group.
    pub blood_group: BloodGroup,
    /// Weight in kilograms.
    pub weight: u32,
    /// Postal address.
    pub address: String,
    /// Whether the donor accepted the terms and conditions.
    #[serde(rename = "terms")]
    pub terms_accepted: bool,
    /// When the donor registered.
    #[serde(rename = "registrationDate")]
    pub registered_at: DateTime<Utc>,
}

impl DonorRecord {
    pub(crate) fn from_application(
        id: String,
        application: DonorApplication,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: application.name().to_string(),
            email: application.email().to_string(),
            phone: application.phone().to_string(),
            age: application.age(),
            blood_group: application.blood_group(),
            weight: application.weight(),
            address: application.address().to_string(),
            terms_accepted: true,
            registered_at,
        }
    }
}

/// Append-only list of donors in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonorRegistry {
    donors: Vec<DonorRecord>,
}

impl DonorRegistry {
    /// Create a registry from previously stored records.
    #[must_use]
    pub fn from_records(donors: Vec<DonorRecord>) -> Self {
        Self { donors }
    }

    /// Registry holding the two demonstration donors.
    #[must_use]
    pub fn with_samples(registered_at: DateTime<Utc>) -> Self {
        let sample = |id: &str,
                      name: &str,
                      email: &str,
                      phone: &str,
                      age: u32,
                      blood_group: BloodGroup,
                      weight: u32,
                      address: &str| DonorRecord {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            age,
            blood_group,
            weight,
            address: address.to_string(),
            terms_accepted: true,
            registered_at,
        };
        Self::from_records(vec![
            sample(
                "1",
                "John Doe",
                "john@example.com",
                "+1234567890",
                25,
                BloodGroup::OPositive,
                70,
                "123 Main St, City, State",
            ),
            sample(
                "2",
                "Jane Smith",
                "jane@example.com",
                "+1234567891",
                30,
                BloodGroup::APositive,
                65,
                "456 Oak Ave, City, State",
            ),
        ])
    }

    /// Number of registered donors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.donors.len()
    }

    /// Whether no donor has registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.donors.is_empty()
    }

    /// Donors in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, DonorRecord> {
        self.donors.iter()
    }

    /// The donor registered with exactly this email.
    #[must_use]
    pub fn find_by_email(&self, email: &str) -> Option<&DonorRecord> {
        self.donors.iter().find(|donor| donor.email == email)
    }

    /// Most recently registered donor.
    #[must_use]
    pub fn latest(&self) -> Option<&DonorRecord> {
        self.donors.last()
    }

    pub(crate) fn push(&mut self, donor: DonorRecord) {
        self.donors.push(donor);
    }
}

impl<'a> IntoIterator for &'a DonorRegistry {
    type Item = &'a DonorRecord;
    type IntoIter = std::slice::Iter<'a, DonorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.donors.iter()
    }
}
