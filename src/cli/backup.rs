use std::path::PathBuf;

use clap::Parser;
use licman::{
    Store,
    storage::{list_backups, prune_backups},
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Copy every table into a timestamped backup directory")]
pub struct Backup {
    /// Keep only this many backups, removing the oldest
    #[arg(long, value_name = "N")]
    keep: Option<usize>,

    /// List existing backups instead of creating one
    #[arg(long, conflicts_with = "keep")]
    list: bool,
}

impl Backup {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let backup_dir = store.backup_dir();

        if self.list {
            let backups = list_backups(&backup_dir);
            if backups.is_empty() {
                println!("{}", "No backups found.".dim());
            }
            for backup in backups {
                println!("{}  {}", backup.taken_at, backup.path.display());
            }
            return Ok(());
        }

        let dir = store.backup(chrono::Local::now().naive_local())?;
        println!(
            "{}",
            format!("✅ Backup created in {}", dir.display()).success()
        );

        if let Some(keep) = self.keep.or(store.config().max_backups) {
            for removed in prune_backups(&backup_dir, keep)? {
                println!("{}", format!("Removed {}", removed.display()).dim());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn creates_and_lists_backups() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        Backup {
            keep: Some(3),
            list: false,
        }
        .run(root.clone())
        .expect("backup should succeed");

        let store = Store::open(root.clone()).unwrap();
        assert_eq!(list_backups(&store.backup_dir()).len(), 1);

        Backup {
            keep: None,
            list: true,
        }
        .run(root)
        .expect("listing should succeed");
    }
}
