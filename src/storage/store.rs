//! A filesystem backed store of license tables
//!
//! The [`Store`] owns a root directory holding `config.toml`, the data
//! directory with one CSV file per [`Table`], and the backup directory. It
//! keeps no table contents between calls: every operation reloads the table
//! it needs and every mutation rewrites the whole file.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{NaiveDate, NaiveDateTime};

use super::{
    AddLicenseError, AddRequestError, AddUserError, BackupError, Loaded, StoreError,
    backup::{create_backup, prune_backups},
    counter::{self, COUNTERS_FILE},
    csv_table::{read_table, write_table},
    lock::{Guard, Locks},
};
use crate::domain::{
    Classification, Classifier, Config, DashboardStats, IdPrefix, Issue, NewLicense, NewRequest,
    NewUser, Record, RecordId, RequestStatus, Role, Table, Transition, Validation,
    diagnostic::log_all,
    id::highest_number,
    transition,
    user::{hash_password, verify_password},
    validate,
};

/// The name of the configuration file in the store root.
pub const CONFIG_FILE: &str = "config.toml";

/// The outcome of [`Store::startup`].
#[derive(Debug, Default)]
pub struct StartupReport {
    /// The validation result of every table, against its full schema.
    pub validations: Vec<(Table, Validation)>,
    /// The backup taken, if backups on start are enabled and it succeeded.
    pub backup: Option<PathBuf>,
    /// Old backups removed by the retention limit.
    pub pruned: Vec<PathBuf>,
}

/// A filesystem backed store of licenses, requests and users.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    config: Config,
    locks: Locks,
}

impl Store {
    /// Opens the store rooted at `root`.
    ///
    /// The configuration is read from `root/config.toml`; a missing or
    /// invalid file falls back to the defaults. The data directory is created
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open(root: PathBuf) -> Result<Self, StoreError> {
        let config = load_config(&root);
        Self::with_config(root, config)
    }

    /// Opens the store rooted at `root` with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn with_config(root: PathBuf, config: Config) -> Result<Self, StoreError> {
        let store = Self {
            root,
            config,
            locks: Locks::default(),
        };
        let data_dir = store.data_dir();
        std::fs::create_dir_all(&data_dir).map_err(|e| StoreError::io(&data_dir, e))?;
        Ok(store)
    }

    /// The store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The directory holding the table files.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(&self.config.data_dir)
    }

    /// The directory holding backups.
    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(&self.config.backup_dir)
    }

    /// The file backing `table`.
    #[must_use]
    pub fn table_path(&self, table: Table) -> PathBuf {
        self.data_dir().join(table.file_name())
    }

    fn counters_path(&self) -> PathBuf {
        self.data_dir().join(COUNTERS_FILE)
    }

    fn lock_timeout(&self) -> Duration {
        self.config.lock_timeout()
    }

    fn lock(&self, table: Table) -> Result<Guard<'_>, StoreError> {
        self.locks
            .lock_table(table, &self.table_path(table), self.lock_timeout())
    }

    /// Reads every record of `table`.
    ///
    /// A missing, unreadable or malformed table reads as empty. Any findings
    /// are logged as warnings; use [`Store::load_checked`] to receive them
    /// instead.
    #[must_use]
    pub fn load(&self, table: Table) -> Vec<Record> {
        let loaded = self.load_checked(table);
        log_all(&loaded.diagnostics);
        loaded.records
    }

    /// Reads every record of `table` together with any findings.
    #[must_use]
    pub fn load_checked(&self, table: Table) -> Loaded {
        read_table(&self.table_path(table))
    }

    /// Reads `table` ahead of a rewrite, with the table lock held.
    ///
    /// A missing table is empty, but an unreadable one is an error: writing
    /// back what was read would discard every row.
    fn load_for_write(&self, table: Table) -> Result<Vec<Record>, StoreError> {
        let loaded = self.load_checked(table);
        log_all(&loaded.diagnostics);

        if let Some(reason) = loaded.diagnostics.iter().find_map(|d| match &d.issue {
            Issue::Unreadable(reason) => Some(reason.clone()),
            _ => None,
        }) {
            return Err(StoreError::Unreadable {
                path: self.table_path(table),
                reason,
            });
        }
        Ok(loaded.records)
    }

    /// Replaces `table` with exactly `records`, using `fields` as the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock cannot be taken or the file cannot
    /// be written.
    pub fn save(&self, table: Table, fields: &[&str], records: &[Record]) -> Result<(), StoreError> {
        let _guard = self.lock(table)?;
        write_table(&self.table_path(table), fields, records)
    }

    /// Appends `record` to `table` by rewriting the whole table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock cannot be taken or the file cannot
    /// be written.
    pub fn append(&self, table: Table, fields: &[&str], record: Record) -> Result<(), StoreError> {
        self.mutate_with(table, fields, |records| {
            records.push(record);
            Ok::<_, StoreError>(((), true))
        })
    }

    /// Runs one lock-scoped read-modify-write cycle against `table`.
    ///
    /// The mutator returns `(value, changed)`. When `changed` is `true` the
    /// table is written back, with its own schema as the header, before the
    /// lock is released.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be taken, the table exists but
    /// cannot be read, the mutator fails, or the table cannot be written.
    /// An unreadable table is left as it is.
    pub fn mutate<T, E, F>(&self, table: Table, mutator: F) -> Result<T, E>
    where
        F: FnOnce(&mut Vec<Record>) -> Result<(T, bool), E>,
        E: From<StoreError>,
    {
        self.mutate_with(table, table.fields(), mutator)
    }

    fn mutate_with<T, E, F>(&self, table: Table, fields: &[&str], mutator: F) -> Result<T, E>
    where
        F: FnOnce(&mut Vec<Record>) -> Result<(T, bool), E>,
        E: From<StoreError>,
    {
        let _guard = self.lock(table)?;
        let mut records = self.load_for_write(table)?;
        let (value, changed) = mutator(&mut records)?;
        if changed {
            write_table(&self.table_path(table), fields, &records)?;
        }
        Ok(value)
    }

    /// Allocates a fresh identifier with `prefix` for a record of `table`.
    ///
    /// Unlike [`next_id`](crate::domain::next_id), this advances a persisted
    /// counter under the table lock, so concurrent callers always receive
    /// distinct identifiers and numbers are never reused after deletions.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock cannot be taken or the counter cannot be
    /// written.
    pub fn allocate_id(&self, table: Table, prefix: &IdPrefix) -> Result<RecordId, StoreError> {
        let _guard = self.lock(table)?;
        let records = self.load_for_write(table)?;
        self.allocate_locked(table, &records, prefix)
    }

    /// Allocates an identifier while the caller holds the lock on `table`.
    fn allocate_locked(
        &self,
        table: Table,
        records: &[Record],
        prefix: &IdPrefix,
    ) -> Result<RecordId, StoreError> {
        let counters = self.counters_path();
        let _guard = self.locks.lock_counters(&counters, self.lock_timeout())?;

        let floor = records
            .len()
            .max(highest_number(records, table.key_field(), prefix));
        let number = counter::advance(&counters, prefix, floor)?;
        Ok(RecordId::new(prefix.clone(), number))
    }

    fn format_id(&self, id: &RecordId) -> String {
        id.display(self.config.digits()).to_string()
    }

    /// Adds a license with status `Active` and a fresh `L` identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the license fields are refused or the table
    /// cannot be written.
    pub fn add_license(&self, license: NewLicense) -> Result<Record, AddLicenseError> {
        license.check()?;

        let record = self.mutate(Table::Licenses, |records| {
            let id = self.allocate_locked(Table::Licenses, records, &IdPrefix::license())?;
            let record = license.into_record(&self.format_id(&id));
            records.push(record.clone());
            Ok::<_, StoreError>((record, true))
        })?;

        tracing::info!("Added license {}", record.value("id"));
        Ok(record)
    }

    /// Classifies every license relative to `today` using the configured
    /// window.
    ///
    /// Skipped records are logged as warnings and returned in
    /// [`Classification::skipped`].
    #[must_use]
    pub fn classify_licenses(&self, today: NaiveDate) -> Classification {
        let licenses = self.load(Table::Licenses);
        let classification = self.classifier().classify(&licenses, today);
        log_all(&classification.diagnostics);
        classification
    }

    /// The classifier configured for this store.
    #[must_use]
    pub const fn classifier(&self) -> Classifier {
        Classifier::new(self.config.expiring_window_days())
    }

    /// Licenses assigned to `department`.
    #[must_use]
    pub fn licenses_for_department(&self, department: &str) -> Vec<Record> {
        self.load(Table::Licenses)
            .into_iter()
            .filter(|l| l.value("assigned_department") == department)
            .collect()
    }

    /// Submits a pending access request with a fresh `R` identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is blank or the table cannot be
    /// written.
    pub fn submit_request(
        &self,
        request: NewRequest,
        today: NaiveDate,
    ) -> Result<Record, AddRequestError> {
        self.add_request(request, &IdPrefix::request(), today)
    }

    /// Records a support contact as a pending request with a fresh `C`
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is blank or the table cannot be
    /// written.
    pub fn contact_support(
        &self,
        username: &str,
        subject: &str,
        message: &str,
        today: NaiveDate,
    ) -> Result<Record, AddRequestError> {
        let request = NewRequest::support(username.to_string(), subject, message.to_string());
        self.add_request(request, &IdPrefix::support(), today)
    }

    fn add_request(
        &self,
        request: NewRequest,
        prefix: &IdPrefix,
        today: NaiveDate,
    ) -> Result<Record, AddRequestError> {
        request.check()?;

        let record = self.mutate(Table::Requests, |records| {
            let id = self.allocate_locked(Table::Requests, records, prefix)?;
            let record = request.into_record(&self.format_id(&id), today);
            records.push(record.clone());
            Ok::<_, StoreError>((record, true))
        })?;

        tracing::info!("Submitted request {}", record.value("request_id"));
        Ok(record)
    }

    /// Applies a status transition to the request `request_id`.
    ///
    /// The table is only written when the transition is applied. An unknown
    /// identifier is not an error; it is reported as
    /// [`Transition::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock cannot be taken or the file cannot
    /// be written.
    pub fn decide_request(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<Transition, StoreError> {
        let outcome = self.mutate(Table::Requests, |records| {
            let outcome = transition(records, request_id, status);
            Ok::<_, StoreError>((outcome, outcome.is_applied()))
        })?;

        match outcome {
            Transition::Applied { to, .. } => tracing::info!("Request {request_id} {to}"),
            other => tracing::debug!("Request {request_id} left unchanged: {other:?}"),
        }
        Ok(outcome)
    }

    /// Approves the request `request_id`.
    ///
    /// # Errors
    ///
    /// See [`Store::decide_request`].
    pub fn approve_request(&self, request_id: &str) -> Result<Transition, StoreError> {
        self.decide_request(request_id, RequestStatus::Approved)
    }

    /// Rejects the request `request_id`.
    ///
    /// # Errors
    ///
    /// See [`Store::decide_request`].
    pub fn reject_request(&self, request_id: &str) -> Result<Transition, StoreError> {
        self.decide_request(request_id, RequestStatus::Rejected)
    }

    /// Requests submitted by `username`.
    #[must_use]
    pub fn requests_for_user(&self, username: &str) -> Vec<Record> {
        self.load(Table::Requests)
            .into_iter()
            .filter(|r| r.value("username") == username)
            .collect()
    }

    /// Adds a user with a hashed password and status `Active`.
    ///
    /// # Errors
    ///
    /// Returns [`AddUserError::Duplicate`] without touching the table if the
    /// username is taken, or an error if hashing or writing fails.
    pub fn add_user(&self, user: NewUser) -> Result<Record, AddUserError> {
        if user.username.trim().is_empty() {
            return Err(AddUserError::MissingField("username"));
        }
        if user.password.is_empty() {
            return Err(AddUserError::MissingField("password"));
        }

        let record = self.mutate(Table::Users, |records| {
            if records.iter().any(|u| u.value("username") == user.username) {
                return Err(AddUserError::Duplicate(user.username));
            }
            let hash = hash_password(&user.password).map_err(AddUserError::Hash)?;
            let record = user.into_record(hash);
            records.push(record.clone());
            Ok((record, true))
        })?;

        tracing::info!("Added user {}", record.value("username"));
        Ok(record)
    }

    /// Deletes every user named `username`.
    ///
    /// Returns whether any user was removed; the table is only rewritten when
    /// one was.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock cannot be taken or the file cannot
    /// be written.
    pub fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        let removed = self.mutate(Table::Users, |records| {
            let before = records.len();
            records.retain(|u| u.value("username") != username);
            let removed = records.len() != before;
            Ok::<_, StoreError>((removed, removed))
        })?;

        if removed {
            tracing::info!("Deleted user {username}");
        }
        Ok(removed)
    }

    /// Checks a login attempt.
    ///
    /// Returns the user's record, with the password hash removed, when the
    /// username exists, the password verifies and the stored role matches.
    #[must_use]
    pub fn authenticate(&self, username: &str, password: &str, role: Role) -> Option<Record> {
        let user = self
            .load(Table::Users)
            .into_iter()
            .find(|u| u.value("username") == username && u.value("role") == role.as_str())?;

        if !verify_password(password, user.value("password")) {
            tracing::debug!("password mismatch for {username}");
            return None;
        }

        Some(
            user.fields()
                .filter(|&f| f != "password")
                .map(|f| (f, user.value(f)))
                .collect(),
        )
    }

    /// Computes the dashboard counts relative to `today`.
    #[must_use]
    pub fn dashboard(&self, today: NaiveDate) -> DashboardStats {
        let licenses = self.load(Table::Licenses);
        let requests = self.load(Table::Requests);
        let classification = self.classifier().classify(&licenses, today);
        DashboardStats::new(&licenses, &classification, &requests)
    }

    /// Validates every table against its full schema.
    #[must_use]
    pub fn validate_all(&self) -> Vec<(Table, Validation)> {
        Table::ALL
            .into_iter()
            .map(|table| {
                let records = self.load(table);
                (table, validate(&records, table.fields(), table.label()))
            })
            .collect()
    }

    /// Copies every table into a new timestamped backup directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup directory cannot be created or a file
    /// cannot be copied.
    pub fn backup(&self, at: NaiveDateTime) -> Result<PathBuf, BackupError> {
        create_backup(&self.data_dir(), &self.backup_dir(), at)
    }

    /// Runs the checks performed when the application starts.
    ///
    /// Every table is validated and the findings logged. If configured, a
    /// backup is taken and the retention limit applied. Nothing here fails:
    /// problems are logged and reflected in the report.
    pub fn startup(&self, now: NaiveDateTime) -> StartupReport {
        let validations = self.validate_all();
        for (table, validation) in &validations {
            log_all(&validation.diagnostics);
            if validation.well_formed {
                tracing::info!("{table} validated successfully");
            }
        }

        let mut report = StartupReport {
            validations,
            ..StartupReport::default()
        };

        if !self.config.backup_on_start {
            return report;
        }

        match self.backup(now) {
            Ok(dir) => report.backup = Some(dir),
            Err(e) => tracing::warn!("Could not create initial backup: {e}"),
        }

        match self.config.max_backups {
            Some(keep) => match prune_backups(&self.backup_dir(), keep) {
                Ok(pruned) => report.pruned = pruned,
                Err(e) => tracing::warn!("Could not prune backups: {e}"),
            },
            None => tracing::info!(
                "No backup retention limit set; {} grows without bound",
                self.backup_dir().display()
            ),
        }

        report
    }
}

fn load_config(root: &Path) -> Config {
    let path = root.join(CONFIG_FILE);
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}
