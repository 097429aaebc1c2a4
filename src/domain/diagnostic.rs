use std::fmt;

/// A data-quality finding raised while reading, validating or classifying a
/// table.
///
/// Diagnostics never abort the read path. They are returned next to the
/// primary value so that callers can log, display or ignore them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What was being inspected, e.g. `licenses` or a file path.
    pub source: String,
    /// The finding itself.
    pub issue: Issue,
}

/// The kinds of data-quality finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// The backing file does not exist.
    Missing,

    /// The backing file could not be read or parsed.
    Unreadable(String),

    /// The table contains no records.
    Empty,

    /// A record does not have the same set of fields as the first record.
    NonUniform {
        /// Zero-based row index.
        row: usize,
    },

    /// A record lacks a required field.
    MissingField {
        /// Zero-based row index.
        row: usize,
        /// The absent field.
        field: String,
    },

    /// A row had more values than the header has columns.
    ExtraValues {
        /// Zero-based row index.
        row: usize,
        /// How many values were dropped.
        count: usize,
    },

    /// A license has a blank expiry date or status and was not classified.
    Unclassifiable {
        /// The license id, or `unknown`.
        id: String,
    },

    /// A license expiry date is not a `YYYY-MM-DD` date.
    InvalidDate {
        /// The license id, or `unknown`.
        id: String,
        /// The offending value.
        value: String,
    },
}

impl Diagnostic {
    /// Creates a diagnostic for `source`.
    pub fn new(source: impl Into<String>, issue: Issue) -> Self {
        Self {
            source: source.into(),
            issue,
        }
    }

    /// Emits this diagnostic as a warning through `tracing`.
    pub fn log(&self) {
        tracing::warn!("{self}");
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = &self.source;
        match &self.issue {
            Issue::Missing => write!(f, "{source}: file not found"),
            Issue::Unreadable(reason) => write!(f, "{source}: cannot read table: {reason}"),
            Issue::Empty => write!(f, "{source}: table is empty"),
            Issue::NonUniform { row } => {
                write!(f, "{source}: row {row} has a different set of fields")
            }
            Issue::MissingField { row, field } => {
                write!(f, "{source}: missing field '{field}' in row {row}")
            }
            Issue::ExtraValues { row, count } => {
                write!(f, "{source}: row {row} has {count} value(s) beyond the header")
            }
            Issue::Unclassifiable { id } => {
                write!(f, "{source}: license {id} is missing expiry_date or status")
            }
            Issue::InvalidDate { id, value } => {
                write!(f, "{source}: invalid expiry date '{value}' for license {id}")
            }
        }
    }
}

/// Logs every diagnostic in `diagnostics`.
pub fn log_all(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        diagnostic.log();
    }
}
