use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use customer_portal::config::ConfigError;
use customer_portal::net::ServiceError;
use customer_portal::net::types::{Credentials, CustomerInput, Registration};
use customer_portal::state::session::SessionStore;
use customer_portal::state::storage::FileTokenStorage;
use customer_portal::util::guard::{GuardOutcome, Route, nav_links};
use customer_portal::{Portal, ServiceConfig};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

const SESSION_DIR: &str = ".customer-portal";
const SESSION_FILE: &str = "session";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("cannot locate session file; pass --session-file or set PORTAL_SESSION_FILE")]
    NoSessionPath,
    #[error("unknown route `{0}`")]
    UnknownRoute(String),
    #[error("{path} requires login (redirect to {to})")]
    AccessDenied { path: &'static str, to: &'static str },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "portal-cli", about = "Customer portal client")]
struct Cli {
    /// Identity service base URL (overrides AUTH_SERVICE_URL).
    #[arg(long)]
    auth_url: Option<String>,

    /// Data service base URL (overrides DATA_SERVICE_URL).
    #[arg(long)]
    data_url: Option<String>,

    #[arg(long, env = "PORTAL_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the data service is up.
    Status,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Check the stored token with the identity service.
    Whoami,
    /// Show what the access guard does for a path.
    Route {
        path: String,
    },
    Customers(CustomersCommand),
}

#[derive(Args, Debug)]
struct CustomersCommand {
    #[command(subcommand)]
    command: CustomersSubcommand,
}

#[derive(Subcommand, Debug)]
enum CustomersSubcommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    Delete {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let session_path = session_path(cli.session_file, std::env::var_os("HOME").map(PathBuf::from))?;
    tracing::debug!(path = %session_path.display(), "using session file");

    let session = SessionStore::with_storage(FileTokenStorage::new(session_path));
    let portal = Portal::new(&config, session)?;

    match cli.command {
        Command::Status => {
            let status = portal.data().status().await?;
            print_json(&json!({ "status": status.status }))
        }
        Command::Login { email, password } => {
            portal.login(Credentials::new(email, password)).await?;
            print_json(&json!({ "authenticated": true }))
        }
        Command::Register { name, email, password } => {
            let registered = portal.register(Registration::new(name, email, password)).await?;
            print_json(&json!({ "message": registered.message }))
        }
        Command::Logout => {
            let changed = portal.logout();
            print_json(&json!({ "logged_out": changed }))
        }
        Command::Whoami => run_whoami(&portal).await,
        Command::Route { path } => run_route(&portal, &path),
        Command::Customers(customers) => run_customers(&portal, customers).await,
    }
}

fn load_config(cli: &Cli) -> Result<ServiceConfig, CliError> {
    let mut config = ServiceConfig::from_env()?;
    if let Some(url) = &cli.auth_url {
        config = config.with_auth_service_url(url)?;
    }
    if let Some(url) = &cli.data_url {
        config = config.with_data_service_url(url)?;
    }
    Ok(config)
}

fn session_path(explicit: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    home.filter(|h| !h.as_os_str().is_empty())
        .map(|h| h.join(SESSION_DIR).join(SESSION_FILE))
        .ok_or(CliError::NoSessionPath)
}

async fn run_whoami(portal: &Portal) -> Result<(), CliError> {
    let Some(validation) = portal.verify_session().await? else {
        return print_json(&json!({ "authenticated": false }));
    };
    print_json(&json!({
        "authenticated": validation.valid,
        "email": validation.email,
    }))
}

fn run_route(portal: &Portal, path: &str) -> Result<(), CliError> {
    let route = Route::from_path(path).ok_or_else(|| CliError::UnknownRoute(path.to_owned()))?;
    let outcome = portal.guard(route);
    let nav: Vec<&str> = nav_links(&portal.session().snapshot())
        .into_iter()
        .map(Route::path)
        .collect();
    print_json(&json!({
        "route": route.path(),
        "outcome": serde_json::to_value(outcome)?,
        "nav": nav,
    }))
}

fn require_access(portal: &Portal, route: Route) -> Result<(), CliError> {
    match portal.guard(route) {
        GuardOutcome::Render => Ok(()),
        GuardOutcome::Redirect { to } => Err(CliError::AccessDenied { path: route.path(), to }),
    }
}

async fn run_customers(portal: &Portal, customers: CustomersCommand) -> Result<(), CliError> {
    require_access(portal, Route::Customers)?;
    let directory = portal.directory();

    match customers.command {
        CustomersSubcommand::List => {
            directory.refresh().await?;
            print_json(&serde_json::to_value(directory.state().items)?)
        }
        CustomersSubcommand::Create { name, email } => {
            let created = directory.add(&CustomerInput::new(name, email)).await?;
            print_json(&serde_json::to_value(created)?)
        }
        CustomersSubcommand::Update { id, name, email } => {
            let updated = directory.update(id, &CustomerInput::new(name, email)).await?;
            print_json(&serde_json::to_value(updated)?)
        }
        CustomersSubcommand::Delete { id } => {
            directory.remove(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
