use serde::Serialize;

use super::{Classification, Record, RequestStatus};

/// Headline counts shown on the administrator dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Every license row, including ones that could not be classified.
    pub total_licenses: usize,
    /// Licenses in the active bucket.
    pub active_licenses: usize,
    /// Licenses in the expiring bucket.
    pub expiring_licenses: usize,
    /// Licenses in the expired bucket.
    pub expired_licenses: usize,
    /// Requests whose status is exactly `Pending`.
    pub pending_requests: usize,
}

impl DashboardStats {
    /// Computes the counts from a license table, its classification and the
    /// request table.
    #[must_use]
    pub fn new(licenses: &[Record], classification: &Classification, requests: &[Record]) -> Self {
        Self {
            total_licenses: licenses.len(),
            active_licenses: classification.active.len(),
            expiring_licenses: classification.expiring.len(),
            expired_licenses: classification.expired.len(),
            pending_requests: requests
                .iter()
                .filter(|r| r.value("status") == RequestStatus::Pending.as_str())
                .count(),
        }
    }

    /// Licenses that appear in no bucket.
    #[must_use]
    pub const fn unclassified_licenses(&self) -> usize {
        self.total_licenses
            .saturating_sub(self.active_licenses + self.expiring_licenses + self.expired_licenses)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::classify;

    #[test]
    fn counts_buckets_and_pending() {
        let licenses = vec![
            Record::from_iter([("id", "L001"), ("expiry_date", "2024-01-10"), ("status", "Active")]),
            Record::from_iter([("id", "L002"), ("expiry_date", "2023-01-01"), ("status", "Active")]),
            Record::from_iter([("id", "L003"), ("expiry_date", "bad"), ("status", "Active")]),
        ];
        let requests = vec![
            Record::from_iter([("request_id", "R001"), ("status", "Pending")]),
            Record::from_iter([("request_id", "R002"), ("status", "Approved")]),
            Record::from_iter([("request_id", "C003"), ("status", "Pending")]),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let stats = DashboardStats::new(&licenses, &classify(&licenses, today), &requests);

        assert_eq!(
            stats,
            DashboardStats {
                total_licenses: 3,
                active_licenses: 0,
                expiring_licenses: 1,
                expired_licenses: 1,
                pending_requests: 2,
            }
        );
        assert_eq!(stats.unclassified_licenses(), 1);
    }
}
