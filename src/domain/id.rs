use std::{fmt, num::NonZeroUsize, ops::Deref, str::FromStr};

use non_empty_string::{NonEmptyString, non_empty_string};

use super::Record;

/// The default number of digits in a record identifier.
pub const DEFAULT_DIGITS: usize = 3;

/// A validated identifier prefix containing only uppercase letters ([A-Z]+).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdPrefix(NonEmptyString);

impl IdPrefix {
    /// Creates a new `IdPrefix` from a string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPrefixError` if the string is empty or contains
    /// characters other than uppercase letters (A-Z).
    pub fn new(s: String) -> Result<Self, InvalidPrefixError> {
        let non_empty =
            NonEmptyString::new(s.clone()).map_err(|_| InvalidPrefixError(s.clone()))?;

        if !s.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(InvalidPrefixError(s));
        }

        Ok(Self(non_empty))
    }

    /// Prefix of license identifiers (`L001`).
    #[must_use]
    pub fn license() -> Self {
        Self(non_empty_string!("L"))
    }

    /// Prefix of access request identifiers (`R001`).
    #[must_use]
    pub fn request() -> Self {
        Self(non_empty_string!("R"))
    }

    /// Prefix of support contact identifiers (`C001`).
    #[must_use]
    pub fn support() -> Self {
        Self(non_empty_string!("C"))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for IdPrefix {
    type Error = InvalidPrefixError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl Deref for IdPrefix {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for IdPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string doesn't match the required pattern [A-Z]+.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid prefix '{0}': must be non-empty and contain only uppercase letters (A-Z)")]
pub struct InvalidPrefixError(String);

/// A human-readable record identifier such as `L001` or `R042`.
///
/// Format: `{PREFIX}{NUMBER}`, where `PREFIX` is one or more uppercase letters
/// and `NUMBER` is a positive integer padded with leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId {
    prefix: IdPrefix,
    number: NonZeroUsize,
}

impl RecordId {
    /// Creates an identifier from pre-validated parts.
    #[must_use]
    pub const fn new(prefix: IdPrefix, number: NonZeroUsize) -> Self {
        Self { prefix, number }
    }

    /// The alphabetic prefix.
    #[must_use]
    pub const fn prefix(&self) -> &IdPrefix {
        &self.prefix
    }

    /// The numeric component.
    #[must_use]
    pub const fn number(&self) -> NonZeroUsize {
        self.number
    }

    /// Returns a displayable representation with the specified digit width.
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use licman::domain::id::{IdPrefix, RecordId};
    ///
    /// let id = RecordId::new(IdPrefix::license(), NonZeroUsize::new(7).unwrap());
    /// assert_eq!(id.display(3).to_string(), "L007");
    /// assert_eq!(id.display(1).to_string(), "L7");
    /// ```
    #[must_use]
    pub const fn display(&self, digits: usize) -> FormattedId<'_> {
        FormattedId { id: self, digits }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display(DEFAULT_DIGITS))
    }
}

/// A [`RecordId`] formatted with a fixed digit width.
#[derive(Debug, Clone, Copy)]
pub struct FormattedId<'a> {
    id: &'a RecordId,
    digits: usize,
}

impl fmt::Display for FormattedId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.id.prefix,
            self.id.number,
            width = self.digits
        )
    }
}

/// Errors that can occur when parsing a record identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The identifier has no prefix or no numeric part.
    #[error("Invalid record ID format: {0}")]
    Syntax(String),

    /// The numeric part is not a positive integer.
    #[error("Invalid number in record ID '{0}': expected a non-zero integer, got {1}")]
    Number(String, String),

    /// The prefix is not uppercase alphabetic.
    #[error(transparent)]
    Prefix(#[from] InvalidPrefixError),
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| Error::Syntax(s.to_string()))?;
        let (prefix, digits) = s.split_at(split);
        if prefix.is_empty() || digits.is_empty() {
            return Err(Error::Syntax(s.to_string()));
        }

        let prefix = IdPrefix::new(prefix.to_string())?;
        let number = digits
            .parse::<usize>()
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| Error::Number(s.to_string(), digits.to_string()))?;

        Ok(Self::new(prefix, number))
    }
}

impl TryFrom<&str> for RecordId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

/// Computes the next identifier from the current length of a table.
///
/// The result is `prefix` followed by `records.len() + 1`. It does not look
/// at existing identifiers, so two callers holding the same snapshot receive
/// the same value, and deleting rows allows numbers to be reused. Writers
/// should go through [`Store::allocate_id`](crate::storage::Store::allocate_id)
/// instead, which keeps a persisted counter.
#[must_use]
pub fn next_id(records: &[Record], prefix: &IdPrefix) -> RecordId {
    RecordId::new(prefix.clone(), NonZeroUsize::MIN.saturating_add(records.len()))
}

/// The highest number among identifiers in `field` that carry `prefix`.
///
/// Values that do not parse as identifiers are ignored.
#[must_use]
pub fn highest_number(records: &[Record], field: &str, prefix: &IdPrefix) -> usize {
    records
        .iter()
        .filter_map(|record| record.value(field).parse::<RecordId>().ok())
        .filter(|id| id.prefix() == prefix)
        .map(|id| id.number().get())
        .max()
        .unwrap_or(0)
}
