//! CSV serialization of whole tables.
//!
//! Tables are read leniently and written atomically: a table is written to a
//! temporary file next to its target and renamed into place, so readers see
//! either the old or the new contents and never a partial file.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use super::StoreError;
use crate::domain::{Diagnostic, Issue, Record};

/// Records read from a table, with any findings raised along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loaded {
    /// The records, in file order.
    pub records: Vec<Record>,
    /// Findings about the file or its rows.
    pub diagnostics: Vec<Diagnostic>,
}

/// Reads every record from the CSV file at `path`.
///
/// This never fails. A missing, unreadable or malformed file yields no
/// records and a diagnostic. Rows shorter than the header produce records
/// without the trailing fields; values beyond the header are dropped with a
/// diagnostic.
#[must_use]
pub fn read_table(path: &Path) -> Loaded {
    let source = path.display().to_string();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Loaded {
                records: Vec::new(),
                diagnostics: vec![Diagnostic::new(source, Issue::Missing)],
            };
        }
        Err(e) => {
            return Loaded {
                records: Vec::new(),
                diagnostics: vec![Diagnostic::new(source, Issue::Unreadable(e.to_string()))],
            };
        }
    };

    match read_records(file, &source) {
        Ok(loaded) => {
            tracing::debug!("read {} record(s) from {source}", loaded.records.len());
            loaded
        }
        Err(e) => Loaded {
            records: Vec::new(),
            diagnostics: vec![Diagnostic::new(source, Issue::Unreadable(e.to_string()))],
        },
    }
}

fn read_records<R: Read>(reader: R, source: &str) -> Result<Loaded, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut loaded = Loaded::default();
    for (row, result) in reader.records().enumerate() {
        let values = result?;

        let extra = values.len().saturating_sub(headers.len());
        if extra > 0 {
            loaded.diagnostics.push(Diagnostic::new(
                source,
                Issue::ExtraValues { row, count: extra },
            ));
        }

        loaded
            .records
            .push(headers.iter().zip(values.iter()).collect());
    }

    Ok(loaded)
}

/// Replaces the CSV file at `path` with exactly `records`.
///
/// The header row is `fields`. A record lacking one of `fields` is written
/// with an empty value; keys not named in `fields` are not written.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written, or
/// renamed over `path`.
pub fn write_table(path: &Path, fields: &[&str], records: &[Record]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;

    write_records(BufWriter::new(tmp.as_file_mut()), fields, records).map_err(|source| {
        StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    })?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(tmp.path(), e))?;

    tmp.persist(path).map_err(|source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

fn write_records<W: Write>(
    writer: W,
    fields: &[&str],
    records: &[Record],
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(fields)?;

    for record in records {
        if let Some(unknown) = record.fields().find(|f| !fields.contains(f)) {
            tracing::debug!("dropping field '{unknown}' not present in the header");
        }
        writer.write_record(fields.iter().map(|field| record.value(field)))?;
    }

    writer.flush()?;
    Ok(())
}
