use std::path::PathBuf;

use clap::Parser;
use licman::{Store, domain::DashboardStats};
use tracing::instrument;

use super::terminal::{Colorize, is_narrow};

#[derive(Debug, Parser, Default)]
#[command(about = "Show license and request counts")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress headers and format for scripting
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Status {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let stats = store.dashboard(super::today());

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            OutputFormat::Table if self.quiet => Self::output_quiet(&stats),
            OutputFormat::Table => Self::output_table(&stats),
        }

        Ok(())
    }

    fn output_quiet(stats: &DashboardStats) {
        println!(
            "total={} active={} expiring={} expired={} pending={}",
            stats.total_licenses,
            stats.active_licenses,
            stats.expiring_licenses,
            stats.expired_licenses,
            stats.pending_requests
        );
    }

    fn output_table(stats: &DashboardStats) {
        if stats.total_licenses == 0 && stats.pending_requests == 0 {
            println!("No licenses found yet. Add one with 'licman license add'.");
            return;
        }

        let rows = [
            ("Active", stats.active_licenses.to_string().success()),
            ("Expiring", stats.expiring_licenses.to_string().warning()),
            ("Expired", stats.expired_licenses.to_string().error()),
        ];

        println!("Licenses");
        println!("{}", "────────".dim());
        if is_narrow() {
            for (label, count) in &rows {
                println!("{label}: {count}");
            }
        } else {
            println!("{:<10} Count", "Bucket");
            for (label, count) in &rows {
                println!("{label:<10} {count}");
            }
        }
        println!("Total      {}", stats.total_licenses);

        let unclassified = stats.unclassified_licenses();
        if unclassified > 0 {
            println!(
                "{}",
                format!("{unclassified} license(s) have no valid expiry date").warning()
            );
            println!("{}", "Run 'licman validate -v' to see them.".dim());
        }

        println!();
        if stats.pending_requests == 0 {
            println!("Pending requests: {} ✅", "0".success());
        } else {
            println!(
                "Pending requests: {} ⏳",
                stats.pending_requests.to_string().warning()
            );
            println!("{}", "Run 'licman request list' to review them.".dim());
        }
    }
}
