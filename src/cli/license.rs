use std::path::PathBuf;

use chrono::NaiveDate;
use licman::{
    Store, Table,
    domain::{NewLicense, license::license_id},
};
use tracing::instrument;

use super::{listing::print_records, terminal::Colorize};

const COLUMNS: &[&str] = &[
    "id",
    "software_name",
    "category",
    "assigned_department",
    "assigned_device",
    "start_date",
    "expiry_date",
    "status",
];

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: LicenseCommand,
}

#[derive(Debug, clap::Parser)]
enum LicenseCommand {
    /// Add a license to the inventory
    Add(Add),

    /// List licenses, optionally for one department or bucket
    List(List),
}

impl Command {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self.command {
            LicenseCommand::Add(add) => add.run(root),
            LicenseCommand::List(list) => list.run(root),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// Product name
    #[arg(long)]
    pub software_name: String,

    /// Free-text category, e.g. Productivity
    #[arg(long)]
    pub category: String,

    /// The license key
    #[arg(long)]
    pub license_key: String,

    /// The department the license belongs to
    #[arg(long)]
    pub department: String,

    /// The device the license is installed on
    #[arg(long)]
    pub device: Option<String>,

    /// First day of validity (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: NaiveDate,

    /// Last day of validity (YYYY-MM-DD)
    #[arg(long)]
    pub expiry_date: NaiveDate,
}

impl Add {
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let record = store.add_license(NewLicense {
            software_name: self.software_name,
            category: self.category,
            license_key: self.license_key,
            assigned_department: self.department,
            assigned_device: self.device,
            start_date: self.start_date,
            expiry_date: self.expiry_date,
        })?;

        println!(
            "{}",
            format!("✅ Added license {}", record.value("id")).success()
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum BucketFilter {
    Active,
    Expiring,
    Expired,
}

#[derive(Debug, clap::Parser)]
pub struct List {
    /// Only show licenses assigned to this department
    #[arg(long, short)]
    department: Option<String>,

    /// Only show licenses in this expiry bucket
    #[arg(long, conflicts_with = "department")]
    bucket: Option<BucketFilter>,
}

impl List {
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;

        let mut licenses = match (self.department, self.bucket) {
            (Some(department), _) => store.licenses_for_department(&department),
            (None, Some(bucket)) => {
                let classification = store.classify_licenses(super::today());
                match bucket {
                    BucketFilter::Active => classification.active,
                    BucketFilter::Expiring => classification.expiring,
                    BucketFilter::Expired => classification.expired,
                }
            }
            (None, None) => store.load(Table::Licenses),
        };

        licenses.sort_by_key(|l| license_id(l).ok());
        print_records(&licenses, COLUMNS);
        Ok(())
    }
}
