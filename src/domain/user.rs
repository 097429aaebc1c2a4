use std::{fmt, str::FromStr};

use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};

use super::Record;

/// The role a user logs in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Manages licenses, users and requests.
    Admin,
    /// Views department licenses and submits requests.
    User,
}

impl Role {
    /// The text stored in the `role` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role string is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown role '{0}': expected Admin or User")]
pub struct UnknownRoleError(String);

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Self::Admin),
            "User" => Ok(Self::User),
            other => Err(UnknownRoleError(other.to_string())),
        }
    }
}

/// The fields needed to create a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// The plain-text password; only its hash is stored.
    pub password: String,
    /// The role the user may log in as.
    pub role: Role,
    /// Contact address, may be empty.
    pub email: String,
    /// Department used to select visible licenses, may be empty.
    pub department: String,
}

impl NewUser {
    /// Builds the stored record, replacing the password with `password_hash`.
    #[must_use]
    pub fn into_record(self, password_hash: String) -> Record {
        Record::new()
            .with("username", self.username)
            .with("password", password_hash)
            .with("role", self.role.as_str())
            .with("email", self.email)
            .with("department", self.department)
            .with("status", "Active")
    }
}

/// Hashes a plain password with argon2id and a random salt.
///
/// The result is a PHC string that embeds the salt and parameters.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// Verifies a password against a stored PHC hash.
///
/// Values that are not PHC strings never verify.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::debug!("stored password is not a valid hash: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trips_and_is_salted() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
        assert!(!verify_password("hunter3", &first));
    }

    #[test]
    fn plain_text_never_verifies() {
        assert!(!verify_password("admin123", "admin123"));
    }

    #[test]
    fn record_holds_hash_not_password() {
        let user = NewUser {
            username: "alice".to_string(),
            password: "secret".to_string(),
            role: Role::User,
            email: String::new(),
            department: "Finance".to_string(),
        };
        let record = user.into_record("$argon2id$stub".to_string());

        assert_eq!(record.value("password"), "$argon2id$stub");
        assert_eq!(record.value("role"), "User");
        assert_eq!(record.value("status"), "Active");
    }

    #[test]
    fn role_parses_stored_values() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("admin".parse::<Role>().is_err());
    }
}
