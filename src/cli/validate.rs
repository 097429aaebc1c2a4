use std::{path::PathBuf, process};

use clap::Parser;
use licman::{Store, Table, domain::Validation};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser, Default)]
#[command(about = "Validate every table against its schema")]
pub struct Validate {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Validate {
    /// Runs the startup checks, including the backup if one is configured.
    ///
    /// Exits with status 1 when any table is not well formed.
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let report = store.startup(chrono::Local::now().naive_local());

        match self.output {
            OutputFormat::Json => Self::output_json(&report.validations)?,
            OutputFormat::Table if !self.quiet => Self::output_table(&report.validations),
            OutputFormat::Table => {}
        }

        if let (Some(backup), false) = (&report.backup, self.quiet) {
            println!("{}", format!("Backup created in {}", backup.display()).dim());
        }

        if !Self::all_well_formed(&report.validations) {
            process::exit(1);
        }
        Ok(())
    }

    fn all_well_formed(validations: &[(Table, Validation)]) -> bool {
        validations.iter().all(|(_, v)| v.well_formed)
    }

    fn output_json(validations: &[(Table, Validation)]) -> anyhow::Result<()> {
        use serde_json::json;

        let tables: Vec<_> = validations
            .iter()
            .map(|(table, validation)| {
                json!({
                    "table": table.label(),
                    "well_formed": validation.well_formed,
                    "issues": validation
                        .diagnostics
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        let output = json!({
            "valid": Self::all_well_formed(validations),
            "tables": tables,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_table(validations: &[(Table, Validation)]) {
        for (table, validation) in validations {
            if validation.is_clean() {
                println!("{table}: {} ✅", "ok".success());
                continue;
            }

            let verdict = if validation.well_formed {
                "well formed, with findings".warning()
            } else {
                "not well formed".error()
            };
            println!("{table}: {verdict}");
            for diagnostic in &validation.diagnostics {
                println!("  • {diagnostic}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use licman::{Record, domain::LICENSE_FIELDS};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn uniform_tables_are_well_formed() {
        let tmp = tempdir().unwrap();
        let store = Store::open(tmp.path().to_path_buf()).unwrap();
        let license: Record = LICENSE_FIELDS.iter().map(|&f| (f, "x")).collect();
        store.save(Table::Licenses, LICENSE_FIELDS, &[license]).unwrap();

        let validations = store.validate_all();

        assert!(validations[0].1.is_clean());
        assert!(!Validate::all_well_formed(&validations));
    }
}
