//! Timestamped full copies of the data directory.
//!
//! Each backup is a directory named `backup_<YYYYMMDD_HHMMSS>` holding a copy
//! of every table file present at the time. Nothing is rotated unless a
//! retention limit is passed to [`prune_backups`].

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use chrono::NaiveDateTime;
use nonempty::NonEmpty;
use regex::Regex;
use walkdir::WalkDir;

use super::counter::COUNTERS_FILE;
use crate::domain::Table;

/// The timestamp format used in backup directory names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static BACKUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^backup_(\d{8}_\d{6})$").expect("valid regex"));

/// A backup found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    /// The backup directory.
    pub path: PathBuf,
    /// When the backup was taken, parsed from the directory name.
    pub taken_at: NaiveDateTime,
}

/// Errors raised while creating a backup.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// The backup directory could not be created.
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// Some files could not be copied. Every file was attempted.
    Copy {
        /// The files that failed, with their errors.
        failures: NonEmpty<(PathBuf, io::Error)>,
    },
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir { path, source } => write!(
                f,
                "failed to create backup directory {}: {source}",
                path.display()
            ),
            Self::Copy { failures } => {
                write!(f, "failed to back up: ")?;
                for (i, (path, e)) in failures.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} ({e})", path.display())?;
                }
                Ok(())
            }
        }
    }
}

/// The files copied by a backup, relative to the data directory.
fn backed_up_files() -> impl Iterator<Item = &'static str> {
    Table::ALL
        .into_iter()
        .map(Table::file_name)
        .chain(std::iter::once(COUNTERS_FILE))
}

/// Copies every existing table in `data_dir` into a new
/// `backup_<timestamp>` directory under `backup_root`.
///
/// Missing tables are skipped. If a copy fails the remaining files are still
/// attempted before the error is returned.
///
/// # Errors
///
/// Returns an error if the backup directory cannot be created or if any file
/// cannot be copied.
pub fn create_backup(
    data_dir: &Path,
    backup_root: &Path,
    at: NaiveDateTime,
) -> Result<PathBuf, BackupError> {
    let dir = backup_root.join(format!("backup_{}", at.format(TIMESTAMP_FORMAT)));
    fs::create_dir_all(&dir).map_err(|source| BackupError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let failures: Vec<_> = backed_up_files()
        .map(|name| data_dir.join(name))
        .filter(|source| source.exists())
        .filter_map(|source| {
            let name = source.file_name()?.to_owned();
            fs::copy(&source, dir.join(name)).err().map(|e| (source, e))
        })
        .collect();

    if let Some(failures) = NonEmpty::from_vec(failures) {
        return Err(BackupError::Copy { failures });
    }

    tracing::info!("Backup created in {}", dir.display());
    Ok(dir)
}

/// Lists the backups under `backup_root`, oldest first.
///
/// Entries whose names do not match `backup_<YYYYMMDD_HHMMSS>` are ignored.
#[must_use]
pub fn list_backups(backup_root: &Path) -> Vec<Backup> {
    let mut backups: Vec<Backup> = WalkDir::new(backup_root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?;
            let stamp = BACKUP_NAME.captures(name)?.get(1)?.as_str();
            let taken_at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
            Some(Backup {
                path: entry.into_path(),
                taken_at,
            })
        })
        .collect();

    backups.sort_by(|a, b| a.taken_at.cmp(&b.taken_at).then_with(|| a.path.cmp(&b.path)));
    backups
}

/// Deletes the oldest backups so that at most `keep` remain.
///
/// Returns the removed directories.
///
/// # Errors
///
/// Returns the first error raised while removing a directory.
pub fn prune_backups(backup_root: &Path, keep: usize) -> io::Result<Vec<PathBuf>> {
    let backups = list_backups(backup_root);
    let excess = backups.len().saturating_sub(keep);

    let mut removed = Vec::with_capacity(excess);
    for backup in backups.into_iter().take(excess) {
        fs::remove_dir_all(&backup.path)?;
        tracing::info!("Removed old backup {}", backup.path.display());
        removed.push(backup.path);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn copies_existing_tables_only() {
        let tmp = tempdir().unwrap();
        let data = tmp.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("licenses.csv"), "id\nL001\n").unwrap();
        fs::write(data.join("users.csv"), "username\nadmin\n").unwrap();

        let dir = create_backup(&data, &tmp.path().join("backups"), at("2024-05-06 07:08:09"))
            .unwrap();

        assert!(dir.ends_with("backup_20240506_070809"));
        assert_eq!(
            fs::read_to_string(dir.join("licenses.csv")).unwrap(),
            "id\nL001\n"
        );
        assert!(dir.join("users.csv").exists());
        assert!(!dir.join("requests.csv").exists());
    }

    #[test]
    fn lists_backups_oldest_first_and_ignores_strangers() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("backup_20240102_000000")).unwrap();
        fs::create_dir_all(root.join("backup_20231231_235959")).unwrap();
        fs::create_dir_all(root.join("scratch")).unwrap();
        fs::write(root.join("backup_20240103_000000"), "a file").unwrap();

        let backups = list_backups(root);

        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].taken_at, at("2023-12-31 23:59:59"));
        assert_eq!(backups[1].taken_at, at("2024-01-02 00:00:00"));
    }

    #[test]
    fn prune_keeps_newest() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        for stamp in ["20240101_000000", "20240102_000000", "20240103_000000"] {
            fs::create_dir_all(root.join(format!("backup_{stamp}"))).unwrap();
        }

        let removed = prune_backups(root, 1).unwrap();

        assert_eq!(removed.len(), 2);
        let remaining = list_backups(root);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].taken_at, at("2024-01-03 00:00:00"));
    }

    #[test]
    fn missing_backup_root_lists_nothing() {
        let tmp = tempdir().unwrap();
        assert!(list_backups(&tmp.path().join("absent")).is_empty());
    }
}
