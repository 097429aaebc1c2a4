use std::path::PathBuf;

use licman::{RequestStatus, Store, Table, Transition, domain::NewRequest};
use tracing::instrument;

use super::{listing::print_records, parse_request_id, terminal::Colorize};

const COLUMNS: &[&str] = &[
    "request_id",
    "username",
    "software_name",
    "device",
    "date",
    "status",
];

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: RequestCommand,
}

#[derive(Debug, clap::Parser)]
enum RequestCommand {
    /// Submit a request for access to software
    Submit(Submit),

    /// Approve a pending request
    Approve(Decide),

    /// Reject a pending request
    Reject(Decide),

    /// List requests, optionally for one user
    List(List),
}

impl Command {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self.command {
            RequestCommand::Submit(submit) => submit.run(root),
            RequestCommand::Approve(decide) => decide.run(root, RequestStatus::Approved),
            RequestCommand::Reject(decide) => decide.run(root, RequestStatus::Rejected),
            RequestCommand::List(list) => list.run(root),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Submit {
    /// The requesting user
    #[arg(long, short)]
    pub username: String,

    /// The software being requested
    #[arg(long)]
    pub software_name: String,

    /// Why access is needed
    #[arg(long)]
    pub reason: String,

    /// The device the software is wanted on
    #[arg(long)]
    pub device: Option<String>,
}

impl Submit {
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let record = store.submit_request(
            NewRequest {
                username: self.username,
                software_name: self.software_name,
                reason: self.reason,
                device: self.device,
            },
            super::today(),
        )?;

        println!(
            "{}",
            format!("✅ Submitted request {}", record.value("request_id")).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Support {
    /// The user asking for help
    #[arg(long, short)]
    pub username: String,

    /// A short subject line
    #[arg(long, short)]
    pub subject: String,

    /// The message for the support team
    #[arg(long, short)]
    pub message: String,
}

impl Support {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let record =
            store.contact_support(&self.username, &self.subject, &self.message, super::today())?;

        println!(
            "{}",
            format!(
                "✅ Support request {} sent. The team will contact you shortly.",
                record.value("request_id")
            )
            .success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Decide {
    /// The request identifier, e.g. R001
    #[arg(value_parser = parse_request_id)]
    pub request_id: String,
}

impl Decide {
    pub fn run(self, root: PathBuf, status: RequestStatus) -> anyhow::Result<()> {
        let store = Store::open(root)?;

        match store.decide_request(&self.request_id, status)? {
            Transition::Applied { to, .. } => {
                println!(
                    "{}",
                    format!(
                        "✅ Request {} {}",
                        self.request_id,
                        to.as_str().to_lowercase()
                    )
                    .success()
                );
                Ok(())
            }
            Transition::NotFound => anyhow::bail!("Request {} not found", self.request_id),
            Transition::AlreadyFinal(current) => {
                anyhow::bail!(
                    "Request {} has already been {}",
                    self.request_id,
                    current.as_str().to_lowercase()
                )
            }
            Transition::Illegal(target) => {
                anyhow::bail!("Requests cannot be moved to {target}")
            }
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct List {
    /// Only show requests submitted by this user
    #[arg(long, short)]
    user: Option<String>,

    /// Only show pending requests
    #[arg(long)]
    pending: bool,
}

impl List {
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;

        let mut requests = match self.user {
            Some(user) => store.requests_for_user(&user),
            None => store.load(Table::Requests),
        };
        if self.pending {
            requests.retain(|r| r.value("status") == RequestStatus::Pending.as_str());
        }

        print_records(&requests, COLUMNS);
        Ok(())
    }
}
