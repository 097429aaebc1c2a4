//! Persisted identifier counters.
//!
//! Each identifier prefix has a monotonic counter stored in `counters.toml`.
//! The counter never moves backwards, so numbers are not reused after rows
//! are deleted, and two writers serialized by the table lock can never be
//! handed the same number.

use std::{collections::BTreeMap, fs, io::Write, num::NonZeroUsize, path::Path};

use tempfile::NamedTempFile;

use super::StoreError;
use crate::domain::IdPrefix;

/// The file name of the counter store within the data directory.
pub const COUNTERS_FILE: &str = "counters.toml";

type Counters = BTreeMap<String, usize>;

fn load(path: &Path) -> Counters {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("no counters at {}: {e}", path.display());
            return Counters::new();
        }
    };

    toml::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(
            "ignoring unreadable counters at {}: {e}; counters will be reseeded from the tables",
            path.display()
        );
        Counters::new()
    })
}

fn save(path: &Path, counters: &Counters) -> Result<(), StoreError> {
    let content = toml::to_string(counters)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Advances the counter for `prefix` and returns the new value.
///
/// The counter is first raised to at least `floor`, the highest number the
/// caller knows to be taken, so a missing or reset counter file cannot lead
/// to collisions with existing rows.
///
/// The caller must hold the counters lock.
pub(crate) fn advance(
    path: &Path,
    prefix: &IdPrefix,
    floor: usize,
) -> Result<NonZeroUsize, StoreError> {
    let mut counters = load(path);
    let current = counters.get(prefix.as_str()).copied().unwrap_or(0).max(floor);
    let next = NonZeroUsize::MIN.saturating_add(current);

    counters.insert(prefix.to_string(), next.get());
    save(path, &counters)?;

    tracing::debug!("allocated {prefix}{next}");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn starts_after_floor() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(COUNTERS_FILE);

        assert_eq!(advance(&path, &IdPrefix::license(), 0).unwrap().get(), 1);
        assert_eq!(advance(&path, &IdPrefix::license(), 0).unwrap().get(), 2);
        assert_eq!(advance(&path, &IdPrefix::request(), 7).unwrap().get(), 8);
    }

    #[test]
    fn never_moves_backwards() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(COUNTERS_FILE);

        advance(&path, &IdPrefix::license(), 10).unwrap();
        let next = advance(&path, &IdPrefix::license(), 2).unwrap();

        assert_eq!(next.get(), 12);
    }

    #[test]
    fn counters_replace_file_in_place() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(COUNTERS_FILE);

        advance(&path, &IdPrefix::license(), 0).unwrap();
        advance(&path, &IdPrefix::request(), 3).unwrap();

        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            load(&path),
            Counters::from([("L".to_string(), 1), ("R".to_string(), 4)])
        );
    }

    #[test]
    fn corrupt_file_is_reseeded_from_floor() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(COUNTERS_FILE);
        fs::write(&path, "not = [valid").unwrap();

        let next = advance(&path, &IdPrefix::support(), 4).unwrap();

        assert_eq!(next.get(), 5);
        assert_eq!(load(&path).get("C"), Some(&5));
    }
}
