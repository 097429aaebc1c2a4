use super::{Diagnostic, Record, diagnostic::Issue};

/// The outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// `false` when the table is empty or its records are not uniform.
    ///
    /// Missing required fields do not affect this flag, even when they are
    /// what makes a record differ from the first one.
    pub well_formed: bool,
    /// Every finding, in row order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Validation {
    /// Whether no findings were raised at all.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.well_formed && self.diagnostics.is_empty()
    }
}

/// Checks `records` against a required-field schema.
///
/// This is a reporting function, not a gate: defective records are neither
/// removed nor repaired. The table is structurally invalid if it is empty or
/// if any record has a different set of fields from the first one. For each
/// record lacking a required field a diagnostic is recorded, but the result
/// remains well formed.
#[must_use]
pub fn validate(records: &[Record], required_fields: &[&str], label: &str) -> Validation {
    let mut diagnostics = Vec::new();

    let Some(first) = records.first() else {
        diagnostics.push(Diagnostic::new(label, Issue::Empty));
        return Validation {
            well_formed: false,
            diagnostics,
        };
    };

    let mut well_formed = true;
    for (row, record) in records.iter().enumerate() {
        if !record.fields().eq(first.fields()) {
            diagnostics.push(Diagnostic::new(label, Issue::NonUniform { row }));
            if !differs_only_in(first, record, required_fields) {
                well_formed = false;
            }
        }

        for &field in required_fields {
            if !record.contains(field) {
                diagnostics.push(Diagnostic::new(
                    label,
                    Issue::MissingField {
                        row,
                        field: field.to_string(),
                    },
                ));
            }
        }
    }

    tracing::debug!(
        "validated {} {label} record(s): {} finding(s)",
        records.len(),
        diagnostics.len()
    );

    Validation {
        well_formed,
        diagnostics,
    }
}

/// Whether every field present in one record but not the other is a required
/// field, in which case the gap is reported as a missing field instead.
fn differs_only_in(a: &Record, b: &Record, required_fields: &[&str]) -> bool {
    let only_a = a.fields().filter(|f| !b.contains(f));
    let only_b = b.fields().filter(|f| !a.contains(f));
    only_a.chain(only_b).all(|f| required_fields.contains(&f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn license(id: &str) -> Record {
        Record::new()
            .with("id", id)
            .with("expiry_date", "2030-01-01")
            .with("status", "Active")
    }

    #[test]
    fn empty_table_is_not_well_formed() {
        let result = validate(&[], &["id"], "licenses");
        assert!(!result.well_formed);
        assert_eq!(result.diagnostics[0].issue, Issue::Empty);
    }

    #[test]
    fn complete_table_is_clean() {
        let records = vec![license("L001"), license("L002")];
        let result = validate(&records, &["id", "expiry_date", "status"], "licenses");
        assert!(result.is_clean());
    }

    #[test]
    fn missing_fields_are_reported_but_do_not_fail() {
        let records = vec![license("L001"), license("L002")];
        let result = validate(&records, &["id", "category"], "licenses");

        assert!(result.well_formed);
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(
            result.diagnostics[1].issue,
            Issue::MissingField {
                row: 1,
                field: "category".to_string()
            }
        );
    }

    #[test]
    fn non_uniform_records_fail() {
        let records = vec![license("L001"), Record::new().with("id", "L002")];
        let result = validate(&records, &["id"], "licenses");

        assert!(!result.well_formed);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.issue == Issue::NonUniform { row: 1 })
        );
    }

    #[test]
    fn short_row_missing_required_field_stays_well_formed() {
        let records = vec![
            license("L001"),
            Record::new().with("id", "L002").with("status", "Active"),
        ];
        let result = validate(&records, &["id", "expiry_date", "status"], "licenses");

        assert!(result.well_formed);
        assert_eq!(
            result
                .diagnostics
                .iter()
                .map(|d| d.issue.clone())
                .collect::<Vec<_>>(),
            [
                Issue::NonUniform { row: 1 },
                Issue::MissingField {
                    row: 1,
                    field: "expiry_date".to_string()
                },
            ]
        );
    }

    #[test]
    fn short_first_row_is_also_explained_by_missing_field() {
        let records = vec![Record::new().with("id", "L001"), license("L002")];
        let result = validate(&records, &["id", "expiry_date", "status"], "licenses");

        assert!(result.well_formed);
        assert!(!result.is_clean());
    }

    #[test]
    fn records_are_left_untouched() {
        let records = vec![Record::new().with("id", "L001")];
        let before = records.clone();
        let _ = validate(&records, &["status"], "licenses");
        assert_eq!(records, before);
    }
}
