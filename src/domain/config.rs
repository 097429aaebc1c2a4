use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use super::{classify::DEFAULT_WINDOW_DAYS, id::DEFAULT_DIGITS};

/// Configuration for a license store.
///
/// Relative directories are resolved against the store root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Directory holding the table files.
    pub data_dir: PathBuf,

    /// Directory under which `backup_<timestamp>` folders are created.
    pub backup_dir: PathBuf,

    /// The number of digits in record identifiers.
    ///
    /// Digits are padded to this width with leading zeros, for example
    /// `L001` (3 digits) or `L0001` (4 digits).
    digits: usize,

    /// How many days before expiry a license counts as expiring.
    expiring_window_days: i64,

    /// Whether opening the store for startup creates a backup.
    pub backup_on_start: bool,

    /// How many backups to keep. `None` keeps every backup.
    pub max_backups: Option<usize>,

    /// How long a writer waits for another process's table lock.
    lock_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backup_dir: default_backup_dir(),
            digits: DEFAULT_DIGITS,
            expiring_window_days: DEFAULT_WINDOW_DAYS,
            backup_on_start: true,
            max_backups: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the number of digits for padding identifiers.
    #[must_use]
    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Returns the expiring window in days.
    #[must_use]
    pub const fn expiring_window_days(&self) -> i64 {
        self.expiring_window_days
    }

    /// Returns the cross-process lock timeout.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

const fn default_digits() -> usize {
    DEFAULT_DIGITS
}

const fn default_window() -> i64 {
    DEFAULT_WINDOW_DAYS
}

const fn default_true() -> bool {
    true
}

const fn default_lock_timeout_ms() -> u64 {
    2000
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_data_dir")]
        data_dir: PathBuf,

        #[serde(default = "default_backup_dir")]
        backup_dir: PathBuf,

        #[serde(default = "default_digits")]
        digits: usize,

        #[serde(default = "default_window")]
        expiring_window_days: i64,

        #[serde(default = "default_true")]
        backup_on_start: bool,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_backups: Option<usize>,

        #[serde(default = "default_lock_timeout_ms")]
        lock_timeout_ms: u64,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                data_dir,
                backup_dir,
                digits,
                expiring_window_days,
                backup_on_start,
                max_backups,
                lock_timeout_ms,
            } => Self {
                data_dir,
                backup_dir,
                digits,
                expiring_window_days,
                backup_on_start,
                max_backups,
                lock_timeout_ms,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            data_dir: config.data_dir,
            backup_dir: config.backup_dir,
            digits: config.digits,
            expiring_window_days: config.expiring_window_days,
            backup_on_start: config.backup_on_start,
            max_backups: config.max_backups,
            lock_timeout_ms: config.lock_timeout_ms,
        }
    }
}
