//! Write serialization for tables.
//!
//! Every table has an in-process mutex and a lock file beside it. The mutex
//! orders threads of one process; the lock file, created with `create_new`,
//! keeps other processes out for the duration of a read-modify-write cycle.

use std::{
    ffi::OsString,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
    thread,
    time::{Duration, Instant},
};

use chrono::Utc;

use super::StoreError;
use crate::domain::Table;

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// The path of the lock file guarding `path`.
#[must_use]
pub fn lock_path(path: &Path) -> PathBuf {
    let mut lock: OsString = path.as_os_str().to_os_string();
    lock.push(".lock");
    PathBuf::from(lock)
}

/// One mutex per table, plus one for the identifier counters.
#[derive(Debug, Default)]
pub(crate) struct Locks {
    licenses: Mutex<()>,
    requests: Mutex<()>,
    users: Mutex<()>,
    counters: Mutex<()>,
}

impl Locks {
    const fn table(&self, table: Table) -> &Mutex<()> {
        match table {
            Table::Licenses => &self.licenses,
            Table::Requests => &self.requests,
            Table::Users => &self.users,
        }
    }

    /// Locks `table`, whose file lives at `path`.
    pub(crate) fn lock_table(
        &self,
        table: Table,
        path: &Path,
        timeout: Duration,
    ) -> Result<Guard<'_>, StoreError> {
        Guard::acquire(self.table(table), path, timeout)
    }

    /// Locks the identifier counters, stored at `path`.
    ///
    /// Always taken after a table lock, never before.
    pub(crate) fn lock_counters(
        &self,
        path: &Path,
        timeout: Duration,
    ) -> Result<Guard<'_>, StoreError> {
        Guard::acquire(&self.counters, path, timeout)
    }
}

/// Holds a table's mutex and lock file until dropped.
pub(crate) struct Guard<'a> {
    _file: LockFile,
    _mutex: MutexGuard<'a, ()>,
}

impl<'a> Guard<'a> {
    fn acquire(mutex: &'a Mutex<()>, path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        // `()` holds no state that poisoning could leave broken.
        let mutex = mutex.lock().unwrap_or_else(PoisonError::into_inner);
        let file = LockFile::acquire(&lock_path(path), timeout)?;
        Ok(Self {
            _file: file,
            _mutex: mutex,
        })
    }
}

struct LockFile {
    path: PathBuf,
    _file: File,
}

impl LockFile {
    fn acquire(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    // The owner note is informational; the file's existence is the lock.
                    if let Err(e) = writeln!(
                        file,
                        "pid={}\nutc={}",
                        std::process::id(),
                        Utc::now().to_rfc3339()
                    ) {
                        tracing::debug!(
                            "could not record lock owner in {}: {e}",
                            path.display()
                        );
                    }
                    return Ok(Self {
                        path: path.to_path_buf(),
                        _file: file,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if started.elapsed() >= timeout {
                        tracing::warn!("gave up waiting for {}", path.display());
                        return Err(StoreError::LockBusy(path.to_path_buf()));
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("could not release lock {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn lock_file_sits_beside_table() {
        assert_eq!(
            lock_path(Path::new("data/users.csv")),
            PathBuf::from("data/users.csv.lock")
        );
    }

    #[test]
    fn lock_file_is_removed_on_drop() {
        let tmp = tempdir().unwrap();
        let table = tmp.path().join("users.csv");
        let locks = Locks::default();

        {
            let _guard = locks
                .lock_table(Table::Users, &table, Duration::from_millis(50))
                .unwrap();
            assert!(lock_path(&table).exists());
        }

        assert!(!lock_path(&table).exists());
    }

    #[test]
    fn lock_file_records_owner() {
        let tmp = tempdir().unwrap();
        let table = tmp.path().join("requests.csv");
        let locks = Locks::default();

        let _guard = locks
            .lock_table(Table::Requests, &table, Duration::from_millis(50))
            .unwrap();

        let note = std::fs::read_to_string(lock_path(&table)).unwrap();
        assert!(note.starts_with(&format!("pid={}\n", std::process::id())));
        assert!(note.contains("utc="));
    }

    #[test]
    fn foreign_lock_times_out() {
        let tmp = tempdir().unwrap();
        let table = tmp.path().join("users.csv");
        std::fs::write(lock_path(&table), "pid=0\n").unwrap();

        let locks = Locks::default();
        let result = locks.lock_table(Table::Users, &table, Duration::from_millis(30));

        assert!(matches!(result, Err(StoreError::LockBusy(_))));
    }
}
