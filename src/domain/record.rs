use std::collections::BTreeMap;

/// A flat mapping from field name to textual value.
///
/// Records carry no schema of their own. The field order used when writing a
/// record to disk comes from the [`Table`](super::Table) it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value of `field`, if the record has one.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns the value of `field`, or an empty string if it is absent.
    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        self.get(field).unwrap_or_default()
    }

    /// Whether the record has a value (possibly empty) for `field`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Sets `field` to `value`, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(field.into(), value.into())
    }

    /// Builder-style variant of [`Record::set`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Iterates over the field names present in this record.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of fields in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_defaults_to_empty() {
        let record = Record::new().with("id", "L001");
        assert_eq!(record.value("id"), "L001");
        assert_eq!(record.value("status"), "");
        assert!(record.get("status").is_none());
    }

    #[test]
    fn empty_value_is_still_present() {
        let record = Record::new().with("status", "");
        assert!(record.contains("status"));
        assert_eq!(record.get("status"), Some(""));
    }

    #[test]
    fn set_returns_previous_value() {
        let mut record = Record::from_iter([("status", "Pending")]);
        let previous = record.set("status", "Approved");
        assert_eq!(previous.as_deref(), Some("Pending"));
        assert_eq!(record.value("status"), "Approved");
    }
}
