//! Plain-text Software License Tracking
//!
//! Licenses, access requests and users are kept as CSV tables in a data
//! directory, with timestamped backups alongside.

pub mod domain;
pub use domain::{Classification, Config, Record, RecordId, RequestStatus, Role, Table, Transition};

/// Filesystem storage of license tables.
pub mod storage;
pub use storage::{StartupReport, Store, StoreError};
