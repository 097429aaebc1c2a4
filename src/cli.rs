use std::path::{Path, PathBuf};

mod backup;
mod license;
mod listing;
mod request;
mod status;
mod terminal;
mod user;
mod validate;

use backup::Backup;
use chrono::{Local, NaiveDate};
use clap::ArgAction;
use licman::{Config, Store, Table, storage::CONFIG_FILE};
use status::Status;
use tracing::instrument;
use validate::Validate;

/// The local calendar date, used as the evaluation date for classification.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a request identifier, normalizing to uppercase.
fn parse_request_id(s: &str) -> Result<String, String> {
    let id = s.trim().to_uppercase();
    id.parse::<licman::RecordId>()
        .map(|_| id)
        .map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the root of the license store
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show dashboard counts (default)
    Status(Status),

    /// Initialize a new license store
    Init(Init),

    /// Validate every table and report data-quality findings
    Validate(Validate),

    /// Create a timestamped backup of the data directory
    Backup(Backup),

    /// Add and list licenses
    License(license::Command),

    /// Submit, decide and list access requests
    Request(request::Command),

    /// Contact support
    ///
    /// Support contacts are stored as pending requests with a `C` identifier.
    Support(request::Support),

    /// Manage users
    User(user::Command),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(root)?,
            Self::Init(command) => command.run(&root)?,
            Self::Validate(command) => command.run(root)?,
            Self::Backup(command) => command.run(root)?,
            Self::License(command) => command.run(root)?,
            Self::Request(command) => command.run(root)?,
            Self::Support(command) => command.run(root)?,
            Self::User(command) => command.run(root)?,
        }
        Ok(())
    }
}

#[derive(Debug, Default, clap::Parser)]
pub struct Init {
    /// Create an administrator with this username
    #[arg(long, value_name = "USERNAME")]
    admin: Option<String>,

    /// The administrator's password (prompted for if omitted)
    #[arg(long, requires = "admin")]
    password: Option<String>,
}

impl Init {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        use terminal::Colorize;

        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!(
                "License store already initialized (found existing {})",
                config_path.display()
            );
        }

        std::fs::create_dir_all(root)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", root.display()))?;

        let config = Config::default();
        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {CONFIG_FILE}: {e}"))?;

        let store = Store::with_config(root.to_path_buf(), config)?;
        for table in Table::ALL {
            if !store.table_path(table).exists() {
                store.save(table, table.fields(), &[])?;
            }
        }

        if let Some(username) = self.admin {
            let password = match self.password {
                Some(password) => password,
                None => user::prompt_password()?,
            };
            store.add_user(licman::domain::NewUser {
                username,
                password,
                role: licman::Role::Admin,
                email: String::new(),
                department: String::new(),
            })?;
        }

        store.startup(Local::now().naive_local());

        println!("Initialized license store in {}", root.display());
        println!("  Created: {CONFIG_FILE}");
        for table in Table::ALL {
            println!(
                "  Created: {}",
                store.config().data_dir.join(table.file_name()).display()
            );
        }
        println!();
        println!("{}", "Next steps:".info());
        println!("  licman license add --help");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use licman::{Record, RequestStatus};
    use tempfile::tempdir;

    use super::*;

    fn init(root: &Path) {
        Init {
            admin: Some("admin".to_string()),
            password: Some("s3cret".to_string()),
        }
        .run(root)
        .expect("init should succeed");
    }

    fn statuses(store: &Store) -> Vec<String> {
        store
            .load(Table::Requests)
            .iter()
            .map(|r: &Record| r.value("status").to_string())
            .collect()
    }

    #[test]
    fn init_creates_config_tables_and_admin() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        init(&root);

        assert!(root.join(CONFIG_FILE).exists());
        let store = Store::open(root).unwrap();
        for table in Table::ALL {
            assert!(store.table_path(table).exists());
        }
        assert!(
            store
                .authenticate("admin", "s3cret", licman::Role::Admin)
                .is_some()
        );
        assert_eq!(licman::storage::list_backups(&store.backup_dir()).len(), 1);
    }

    #[test]
    fn init_refuses_existing_store() {
        let tmp = tempdir().unwrap();
        init(tmp.path());

        let again = Init::default().run(tmp.path());

        assert!(again.is_err());
    }

    #[test]
    fn request_ids_are_normalized() {
        assert_eq!(parse_request_id(" r001 ").unwrap(), "R001");
        assert!(parse_request_id("001").is_err());
    }

    #[test]
    fn license_then_request_workflow() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        init(&root);

        license::Add {
            software_name: "Office".to_string(),
            category: "Productivity".to_string(),
            license_key: "KEY-1".to_string(),
            department: "Finance".to_string(),
            device: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        }
        .run(root.clone())
        .expect("license add should succeed");

        request::Submit {
            username: "alice".to_string(),
            software_name: "IDE".to_string(),
            reason: "development".to_string(),
            device: Some("LAPTOP-7".to_string()),
        }
        .run(root.clone())
        .expect("request submit should succeed");

        request::Support {
            username: "alice".to_string(),
            subject: "VPN".to_string(),
            message: "Cannot connect".to_string(),
        }
        .run(root.clone())
        .expect("support should succeed");

        request::Decide {
            request_id: "R001".to_string(),
        }
        .run(root.clone(), RequestStatus::Approved)
        .expect("approve should succeed");

        let store = Store::open(root).unwrap();
        assert_eq!(store.load(Table::Licenses)[0].value("id"), "L001");
        assert_eq!(statuses(&store), ["Approved", "Pending"]);
        assert_eq!(store.load(Table::Requests)[1].value("request_id"), "C002");
    }

    #[test]
    fn deciding_unknown_request_fails_without_writing() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        init(&root);
        let store = Store::open(root.clone()).unwrap();
        let before = std::fs::read(store.table_path(Table::Requests)).unwrap();

        let result = request::Decide {
            request_id: "R404".to_string(),
        }
        .run(root, RequestStatus::Rejected);

        assert!(result.is_err());
        assert_eq!(
            std::fs::read(store.table_path(Table::Requests)).unwrap(),
            before
        );
    }

    #[test]
    fn status_runs_on_fresh_store() {
        let tmp = tempdir().unwrap();
        init(tmp.path());

        Status::default()
            .run(tmp.path().to_path_buf())
            .expect("status should succeed");
    }
}
