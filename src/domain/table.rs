use std::fmt;

/// Field order of the license table.
pub const LICENSE_FIELDS: &[&str] = &[
    "id",
    "software_name",
    "category",
    "license_key",
    "assigned_department",
    "assigned_device",
    "start_date",
    "expiry_date",
    "status",
];

/// Field order of the access request table.
pub const REQUEST_FIELDS: &[&str] = &[
    "request_id",
    "username",
    "software_name",
    "reason",
    "date",
    "status",
    "device",
];

/// Field order of the user table.
pub const USER_FIELDS: &[&str] = &["username", "password", "role", "email", "department", "status"];

/// One of the three persisted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// The license inventory.
    Licenses,
    /// Access requests and support contacts.
    Requests,
    /// The user roster.
    Users,
}

impl Table {
    /// Every table, in the order they are validated and backed up.
    pub const ALL: [Self; 3] = [Self::Licenses, Self::Requests, Self::Users];

    /// The name of the file backing this table.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Licenses => "licenses.csv",
            Self::Requests => "requests.csv",
            Self::Users => "users.csv",
        }
    }

    /// The header written for this table, in column order.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Licenses => LICENSE_FIELDS,
            Self::Requests => REQUEST_FIELDS,
            Self::Users => USER_FIELDS,
        }
    }

    /// The field identifying a record within this table.
    #[must_use]
    pub const fn key_field(self) -> &'static str {
        match self {
            Self::Licenses => "id",
            Self::Requests => "request_id",
            Self::Users => "username",
        }
    }

    /// A short lowercase label used in diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Licenses => "licenses",
            Self::Requests => "requests",
            Self::Users => "users",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_field_is_first_column() {
        for table in Table::ALL {
            assert_eq!(table.fields()[0], table.key_field());
        }
    }
}
