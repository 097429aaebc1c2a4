//! Date-derived license classification.
//!
//! A license's bucket is computed from its `expiry_date` and an evaluation
//! date every time it is asked for. It is never written back, and it is
//! independent of the free-text `status` column: a license whose status says
//! `Active` can still land in the expired bucket.

use chrono::NaiveDate;

use super::{Diagnostic, Record, diagnostic::Issue};

/// The default number of days before expiry at which a license counts as
/// expiring.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// The date format used for license dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The derived lifecycle bucket of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// More than the window remains before expiry.
    Active,
    /// Expires today or within the window.
    Expiring,
    /// The expiry date has passed.
    Expired,
}

/// Licenses partitioned by [`Bucket`].
///
/// The three buckets are disjoint. Together with `skipped` they contain every
/// input record exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Licenses with more than the window remaining.
    pub active: Vec<Record>,
    /// Licenses expiring within the window (inclusive on both ends).
    pub expiring: Vec<Record>,
    /// Licenses past their expiry date.
    pub expired: Vec<Record>,
    /// Records excluded because of a blank or unparseable field.
    ///
    /// These appear on no dashboard; `diagnostics` explains each one.
    pub skipped: Vec<Record>,
    /// One finding per skipped record.
    pub diagnostics: Vec<Diagnostic>,
}

impl Classification {
    /// The records in `bucket`.
    #[must_use]
    pub fn bucket(&self, bucket: Bucket) -> &[Record] {
        match bucket {
            Bucket::Active => &self.active,
            Bucket::Expiring => &self.expiring,
            Bucket::Expired => &self.expired,
        }
    }
}

/// Classifies licenses with a configurable expiring window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    window_days: i64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl Classifier {
    /// Creates a classifier whose expiring bucket covers `window_days`.
    #[must_use]
    pub const fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    /// The bucket for a license with `days_left` days until expiry.
    #[must_use]
    pub const fn bucket_for(&self, days_left: i64) -> Bucket {
        if days_left > self.window_days {
            Bucket::Active
        } else if days_left >= 0 {
            Bucket::Expiring
        } else {
            Bucket::Expired
        }
    }

    /// Partitions `licenses` relative to `today`.
    ///
    /// Records with a blank `expiry_date` or `status`, or whose expiry date
    /// does not parse as `YYYY-MM-DD`, are skipped with a diagnostic.
    #[must_use]
    pub fn classify(&self, licenses: &[Record], today: NaiveDate) -> Classification {
        let mut classification = Classification::default();

        for license in licenses {
            let id = license.get("id").filter(|id| !id.is_empty()).unwrap_or("unknown");
            let expiry = license.value("expiry_date");

            if expiry.is_empty() || license.value("status").is_empty() {
                classification.skipped.push(license.clone());
                classification.diagnostics.push(Diagnostic::new(
                    "licenses",
                    Issue::Unclassifiable { id: id.to_string() },
                ));
                continue;
            }

            let Ok(expiry_date) = NaiveDate::parse_from_str(expiry, DATE_FORMAT) else {
                classification.skipped.push(license.clone());
                classification.diagnostics.push(Diagnostic::new(
                    "licenses",
                    Issue::InvalidDate {
                        id: id.to_string(),
                        value: expiry.to_string(),
                    },
                ));
                continue;
            };

            let days_left = (expiry_date - today).num_days();
            let target = match self.bucket_for(days_left) {
                Bucket::Active => &mut classification.active,
                Bucket::Expiring => &mut classification.expiring,
                Bucket::Expired => &mut classification.expired,
            };
            target.push(license.clone());
        }

        classification
    }
}

/// Partitions `licenses` relative to `today` using the default 30-day window.
#[must_use]
pub fn classify(licenses: &[Record], today: NaiveDate) -> Classification {
    Classifier::default().classify(licenses, today)
}
