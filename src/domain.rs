//! Domain models for license tracking.
//!
//! This module contains the record type, the table schemas, and the pure
//! functions that validate, classify and transition records. Nothing in here
//! touches the filesystem.

mod config;
pub use config::Config;

/// Date-derived license classification.
pub mod classify;
pub use classify::{Bucket, Classification, Classifier, classify};

mod dashboard;
pub use dashboard::DashboardStats;

/// Data-quality findings.
pub mod diagnostic;
pub use diagnostic::{Diagnostic, Issue};

/// Human-readable record identifiers and the length-based allocator.
pub mod id;
pub use id::{IdPrefix, RecordId, next_id};

/// New license records.
pub mod license;
pub use license::{InvalidLicense, NewLicense};

/// Access request status transitions.
pub mod lifecycle;
pub use lifecycle::{RequestStatus, Transition, transition};

mod record;
pub use record::Record;

/// New access request records.
pub mod request;
pub use request::{InvalidRequest, NewRequest};

mod table;
pub use table::{LICENSE_FIELDS, REQUEST_FIELDS, Table, USER_FIELDS};

/// Users, roles and password hashing.
pub mod user;
pub use user::{NewUser, Role};

/// Required-field validation of whole tables.
pub mod validation;
pub use validation::{Validation, validate};
