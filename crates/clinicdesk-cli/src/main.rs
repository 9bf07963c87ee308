//! clinicdesk - command-line administration client for the clinic
//! appointment platform.
//!
//! Super-admins provision clinics and clinic administrators; clinic
//! administrators manage doctors, slots and appointments and read patient
//! history. Every command goes through the session-aware API client.

mod commands;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clinicdesk_core::{
    ApiClient, ClientConfig, FileSessionStore, KeyringSessionStore, SessionStore, Settings,
};

/// Set to `1` to also write logs to a daily file in the cache directory
const LOG_FILE_ENV: &str = "CLINICDESK_LOG_FILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// JSON file in the cache directory
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Parser)]
#[command(name = "clinicdesk", version, about = "Clinic platform administration client")]
struct Cli {
    /// Where the session token is kept
    #[arg(long, value_enum, default_value_t = StoreKind::File, env = "CLINICDESK_STORE")]
    store: StoreKind,

    /// Backend origin, overriding settings and environment
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Drop the local session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Send an arbitrary request relative to the API origin
    Request {
        /// GET, POST, PUT, PATCH or DELETE
        method: String,
        path: String,
        /// JSON body
        #[arg(long)]
        data: Option<String>,
        /// Query parameter as key=value (repeatable)
        #[arg(long = "query", value_parser = commands::parse_key_value)]
        query: Vec<(String, String)>,
        /// Header as name:value (repeatable)
        #[arg(long = "header", value_parser = commands::parse_header)]
        headers: Vec<(String, String)>,
    },
    /// List clinics (super-admin)
    Clinics,
    /// List clinic administrators (super-admin)
    Admins,
    /// List doctors of the signed-in admin's clinic
    Doctors,
    /// Slot management
    Slots {
        #[command(subcommand)]
        command: commands::SlotsCommand,
    },
    /// List appointments, optionally for one day
    Appointments {
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Show a patient's appointment history
    History { patient_id: String },
    /// List medical specialities
    Specialities,
    /// Request a password reset email
    ForgotPassword { email: String },
    /// Set a new password with a reset token
    ResetPassword { token: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match file_log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "clinicdesk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn file_log_dir() -> Option<std::path::PathBuf> {
    if std::env::var(LOG_FILE_ENV).ok().as_deref() != Some("1") {
        return None;
    }
    Settings::cache_dir().ok()
}

fn open_store(kind: StoreKind) -> Result<Arc<dyn SessionStore>> {
    Ok(match kind {
        StoreKind::File => Arc::new(
            FileSessionStore::in_cache_dir().context("Failed to locate session directory")?,
        ),
        StoreKind::Keyring => Arc::new(KeyringSessionStore::default()),
    })
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", commands::describe_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load().unwrap_or_default();
    let mut config = ClientConfig::resolve(&settings);
    if let Some(ref url) = cli.api_url {
        config = ClientConfig::new(url).with_timeout(config.request_timeout);
    }
    info!(base_url = %config.base_url, "clinicdesk starting");

    let store = open_store(cli.store)?;
    let client = ApiClient::new(&config, store).context("Failed to create API client")?;
    let mut invalidations = client.subscribe_invalidations();

    let result = commands::dispatch(&client, &mut settings, cli.command).await;

    // A 401 during the command dropped the session.
    if invalidations.try_recv().is_ok() {
        eprintln!("Session expired. Please run `clinicdesk login` again.");
    }
    result
}
