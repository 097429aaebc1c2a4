use std::path::PathBuf;

use licman::{Role, Store, Table, domain::NewUser};
use tracing::instrument;

use super::{listing::print_records, terminal::Colorize};

/// Everything but the password hash.
const COLUMNS: &[&str] = &["username", "role", "email", "department", "status"];

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Debug, clap::Parser)]
enum UserCommand {
    /// Add a user
    Add(Add),

    /// Delete a user
    Delete(Delete),

    /// List users
    List,

    /// Check a username and password
    Login(Login),
}

impl Command {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self.command {
            UserCommand::Add(add) => add.run(root),
            UserCommand::Delete(delete) => delete.run(root),
            UserCommand::List => {
                let store = Store::open(root)?;
                print_records(&store.load(Table::Users), COLUMNS);
                Ok(())
            }
            UserCommand::Login(login) => login.run(root),
        }
    }
}

fn parse_role(s: &str) -> Result<Role, String> {
    let mut chars = s.trim().chars();
    let capitalized: String = chars
        .next()
        .map(|c| c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
        .unwrap_or_default();
    capitalized.parse().map_err(|e| format!("{e}"))
}

/// Asks for a password twice on the terminal.
pub fn prompt_password() -> anyhow::Result<String> {
    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;
    Ok(password)
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// Unique login name
    username: String,

    /// The role the user logs in as (admin, user)
    #[arg(long, value_parser = parse_role, default_value = "user")]
    role: Role,

    /// Contact address
    #[arg(long, default_value = "")]
    email: String,

    /// Department, used to select visible licenses
    #[arg(long, default_value = "")]
    department: String,

    /// The password (prompted for if omitted)
    #[arg(long)]
    password: Option<String>,
}

impl Add {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let password = match self.password {
            Some(password) => password,
            None => prompt_password()?,
        };

        store.add_user(NewUser {
            username: self.username.clone(),
            password,
            role: self.role,
            email: self.email,
            department: self.department,
        })?;

        println!(
            "{}",
            format!("✅ Added {} {}", self.role.as_str().to_lowercase(), self.username).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Delete {
    /// The user to delete
    username: String,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;

        if !self.yes {
            let proceed = dialoguer::Confirm::new()
                .with_prompt(format!("Delete user {}?", self.username))
                .default(false)
                .interact()?;
            if !proceed {
                println!("Cancelled");
                return Ok(());
            }
        }

        if !store.delete_user(&self.username)? {
            anyhow::bail!("User {} not found", self.username);
        }

        println!(
            "{}",
            format!("✅ Deleted user {}", self.username).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Login {
    /// The username
    username: String,

    /// The role to log in as (admin, user)
    #[arg(long, value_parser = parse_role, default_value = "user")]
    role: Role,

    /// The password (prompted for if omitted)
    #[arg(long)]
    password: Option<String>,
}

impl Login {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let password = match self.password {
            Some(password) => password,
            None => dialoguer::Password::new().with_prompt("Password").interact()?,
        };

        let Some(user) = store.authenticate(&self.username, &password, self.role) else {
            anyhow::bail!("Invalid credentials or role");
        };

        println!(
            "{}",
            format!("✅ Logged in as {} ({})", user.value("username"), user.value("role"))
                .success()
        );
        let department = user.value("department");
        if !department.is_empty() {
            println!("{}", format!("Department: {department}").dim());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use test_case::test_case;

    use super::*;

    #[test_case("admin", Role::Admin; "lowercase admin")]
    #[test_case("USER", Role::User; "uppercase user")]
    #[test_case(" Admin ", Role::Admin; "padded")]
    fn roles_are_case_insensitive(input: &str, expected: Role) {
        assert_eq!(parse_role(input).unwrap(), expected);
    }

    #[test]
    fn unknown_role_is_refused() {
        assert!(parse_role("root").is_err());
    }

    #[test]
    fn add_login_delete() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        Add {
            username: "bob".to_string(),
            role: Role::User,
            email: "bob@example.com".to_string(),
            department: "Finance".to_string(),
            password: Some("hunter2".to_string()),
        }
        .run(root.clone())
        .expect("add should succeed");

        Login {
            username: "bob".to_string(),
            role: Role::User,
            password: Some("hunter2".to_string()),
        }
        .run(root.clone())
        .expect("login should succeed");

        let wrong_role = Login {
            username: "bob".to_string(),
            role: Role::Admin,
            password: Some("hunter2".to_string()),
        }
        .run(root.clone());
        assert!(wrong_role.is_err());

        Delete {
            username: "bob".to_string(),
            yes: true,
        }
        .run(root.clone())
        .expect("delete should succeed");

        let again = Delete {
            username: "bob".to_string(),
            yes: true,
        }
        .run(root);
        assert!(again.is_err());
    }
}
