use std::{io, path::PathBuf};

use crate::domain::{InvalidLicense, InvalidRequest};

/// Errors raised while writing to the store.
///
/// Reads never fail; see [`Store::load`](super::Store::load).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A table could not be serialized.
    #[error("failed to write {path}: {source}")]
    Csv {
        /// The table file being written.
        path: PathBuf,
        /// The underlying error.
        source: csv::Error,
    },

    /// The temporary file could not be moved over the table.
    #[error("failed to replace {path}: {source}")]
    Persist {
        /// The table file being replaced.
        path: PathBuf,
        /// The underlying error.
        source: tempfile::PersistError,
    },

    /// A table could not be read, so it was not rewritten.
    #[error("refusing to rewrite unreadable table {path}: {reason}")]
    Unreadable {
        /// The table file.
        path: PathBuf,
        /// Why the table could not be read.
        reason: String,
    },

    /// Another process held the lock for longer than the configured timeout.
    #[error("lock busy: {0}")]
    LockBusy(PathBuf),

    /// The identifier counters could not be encoded.
    #[error("failed to encode counters: {0}")]
    Counters(#[from] toml::ser::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by [`Store::add_license`](super::Store::add_license).
#[derive(Debug, thiserror::Error)]
pub enum AddLicenseError {
    /// The license fields were refused.
    #[error(transparent)]
    Invalid(#[from] InvalidLicense),

    /// The license table could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised when submitting a request or support contact.
#[derive(Debug, thiserror::Error)]
pub enum AddRequestError {
    /// The request fields were refused.
    #[error(transparent)]
    Invalid(#[from] InvalidRequest),

    /// The request table could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by [`Store::add_user`](super::Store::add_user).
#[derive(Debug, thiserror::Error)]
pub enum AddUserError {
    /// A user with this name already exists. The table was not changed.
    #[error("username '{0}' already exists")]
    Duplicate(String),

    /// The username or password is blank.
    #[error("the {0} field must not be empty")]
    MissingField(&'static str),

    /// The password could not be hashed.
    #[error("failed to hash password: {0}")]
    Hash(password_hash::Error),

    /// The user table could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),
}
