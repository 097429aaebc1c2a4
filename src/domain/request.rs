use chrono::NaiveDate;

use super::{Record, RequestStatus, classify::DATE_FORMAT};

/// Stored in `device` when a license request names no device.
pub const UNSPECIFIED_DEVICE: &str = "Not specified";

/// Stored in `device` for support contacts.
pub const SUPPORT_DEVICE: &str = "Support Request";

/// An access request submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    /// The requesting user.
    pub username: String,
    /// The software being requested.
    pub software_name: String,
    /// Why access is needed.
    pub reason: String,
    /// Device the software is wanted on, if any.
    pub device: Option<String>,
}

/// Reasons a request is refused before it is stored.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidRequest {
    /// A required text field is blank.
    #[error("the {0} field must not be empty")]
    MissingField(&'static str),
}

impl NewRequest {
    /// Builds a support contact from a subject line and message.
    #[must_use]
    pub fn support(username: String, subject: &str, message: String) -> Self {
        Self {
            username,
            software_name: format!("Support Request: {subject}"),
            reason: message,
            device: Some(SUPPORT_DEVICE.to_string()),
        }
    }

    /// Checks that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns the first blank field.
    pub fn check(&self) -> Result<(), InvalidRequest> {
        for (name, value) in [
            ("username", &self.username),
            ("software_name", &self.software_name),
            ("reason", &self.reason),
        ] {
            if value.trim().is_empty() {
                return Err(InvalidRequest::MissingField(name));
            }
        }
        Ok(())
    }

    /// Builds the stored record as a pending request created on `date`.
    #[must_use]
    pub fn into_record(self, request_id: &str, date: NaiveDate) -> Record {
        let device = self
            .device
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| UNSPECIFIED_DEVICE.to_string());

        Record::new()
            .with("request_id", request_id)
            .with("username", self.username)
            .with("software_name", self.software_name)
            .with("reason", self.reason)
            .with("date", date.format(DATE_FORMAT).to_string())
            .with("status", RequestStatus::Pending.as_str())
            .with("device", device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_contact_shape() {
        let request = NewRequest::support(
            "bob".to_string(),
            "VPN broken",
            "Cannot connect since Monday".to_string(),
        );
        let record = request.into_record("C004", NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());

        assert_eq!(record.value("software_name"), "Support Request: VPN broken");
        assert_eq!(record.value("device"), SUPPORT_DEVICE);
        assert_eq!(record.value("status"), "Pending");
        assert_eq!(record.value("date"), "2024-05-06");
    }

    #[test]
    fn device_defaults_when_blank() {
        let request = NewRequest {
            username: "bob".to_string(),
            software_name: "IDE".to_string(),
            reason: "development".to_string(),
            device: Some(String::new()),
        };
        let record = request.into_record("R001", NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
        assert_eq!(record.value("device"), UNSPECIFIED_DEVICE);
    }

    #[test]
    fn blank_reason_is_refused() {
        let request = NewRequest {
            username: "bob".to_string(),
            software_name: "IDE".to_string(),
            reason: " ".to_string(),
            device: None,
        };
        assert_eq!(request.check(), Err(InvalidRequest::MissingField("reason")));
    }
}
