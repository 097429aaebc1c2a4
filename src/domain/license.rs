use chrono::NaiveDate;

use super::{Record, RecordId, classify::DATE_FORMAT};

/// Stored in `assigned_device` when a license is not tied to a device.
pub const UNASSIGNED_DEVICE: &str = "Not assigned";

/// The fields needed to add a license to the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLicense {
    /// Product name.
    pub software_name: String,
    /// Free-text category, e.g. `Productivity`.
    pub category: String,
    /// The license key.
    pub license_key: String,
    /// Department the license belongs to.
    pub assigned_department: String,
    /// Device the license is installed on, if any.
    pub assigned_device: Option<String>,
    /// First day of validity.
    pub start_date: NaiveDate,
    /// Last day of validity.
    pub expiry_date: NaiveDate,
}

/// Reasons a [`NewLicense`] is refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidLicense {
    /// A required text field is blank.
    #[error("the {0} field must not be empty")]
    MissingField(&'static str),

    /// The license would expire before, or on, the day it starts.
    #[error("expiry date {expiry} must be after start date {start}")]
    ExpiresBeforeStart {
        /// The requested start date.
        start: NaiveDate,
        /// The requested expiry date.
        expiry: NaiveDate,
    },
}

impl NewLicense {
    /// Checks that required fields are present and the dates are ordered.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn check(&self) -> Result<(), InvalidLicense> {
        for (name, value) in [
            ("software_name", &self.software_name),
            ("category", &self.category),
            ("license_key", &self.license_key),
            ("assigned_department", &self.assigned_department),
        ] {
            if value.trim().is_empty() {
                return Err(InvalidLicense::MissingField(name));
            }
        }

        if self.expiry_date <= self.start_date {
            return Err(InvalidLicense::ExpiresBeforeStart {
                start: self.start_date,
                expiry: self.expiry_date,
            });
        }

        Ok(())
    }

    /// Builds the stored record under `id` with status `Active`.
    #[must_use]
    pub fn into_record(self, id: &str) -> Record {
        let device = self
            .assigned_device
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| UNASSIGNED_DEVICE.to_string());

        Record::new()
            .with("id", id)
            .with("software_name", self.software_name)
            .with("category", self.category)
            .with("license_key", self.license_key)
            .with("assigned_department", self.assigned_department)
            .with("assigned_device", device)
            .with("start_date", self.start_date.format(DATE_FORMAT).to_string())
            .with("expiry_date", self.expiry_date.format(DATE_FORMAT).to_string())
            .with("status", "Active")
    }
}

/// Parses the `id` column of a license record.
///
/// # Errors
///
/// Returns an error if the column is not a valid identifier.
pub fn license_id(record: &Record) -> Result<RecordId, super::id::Error> {
    record.value("id").parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office() -> NewLicense {
        NewLicense {
            software_name: "Office".to_string(),
            category: "Productivity".to_string(),
            license_key: "XXXX-YYYY".to_string(),
            assigned_department: "Finance".to_string(),
            assigned_device: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn valid_license_passes() {
        assert_eq!(office().check(), Ok(()));
    }

    #[test]
    fn blank_key_is_refused() {
        let license = NewLicense {
            license_key: "  ".to_string(),
            ..office()
        };
        assert_eq!(
            license.check(),
            Err(InvalidLicense::MissingField("license_key"))
        );
    }

    #[test]
    fn expiry_must_follow_start() {
        let license = NewLicense {
            expiry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ..office()
        };
        assert!(matches!(
            license.check(),
            Err(InvalidLicense::ExpiresBeforeStart { .. })
        ));
    }

    #[test]
    fn record_uses_device_sentinel() {
        let record = office().into_record("L001");
        assert_eq!(record.value("assigned_device"), UNASSIGNED_DEVICE);
        assert_eq!(record.value("expiry_date"), "2025-01-01");
        assert_eq!(record.value("status"), "Active");
        assert_eq!(license_id(&record).unwrap().to_string(), "L001");
    }
}
