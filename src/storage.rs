/// Timestamped copies of the data directory.
pub mod backup;
mod counter;
/// CSV encoding of tables.
pub mod csv_table;
mod error;
mod lock;
mod store;

pub use backup::{Backup, BackupError, create_backup, list_backups, prune_backups};
pub use counter::COUNTERS_FILE;
pub use csv_table::{Loaded, read_table, write_table};
pub use error::{AddLicenseError, AddRequestError, AddUserError, StoreError};
pub use lock::lock_path;
pub use store::{CONFIG_FILE, StartupReport, Store};
