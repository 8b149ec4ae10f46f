//! Pocketbook CLI - a terminal client for the Pocketbook personal
//! finance API.
//!
//! Sessions persist across invocations: the first authenticated command
//! prompts for credentials, later ones restore and refresh the stored
//! tokens transparently.

mod app;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

/// Initialize the tracing subscriber for logging.
/// Use the RUST_LOG env var to control the level (e.g. RUST_LOG=debug).
/// Diagnostics go to stderr; a daily-rolled copy lands in the data
/// directory when it is available. The returned guard flushes the file
/// writer on drop.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "pocketbook.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn print_usage() {
    eprintln!("Usage: pocketbook [COMMAND]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status      Show whether a session is active");
    eprintln!("  dashboard   Monthly summary and category breakdown (default)");
    eprintln!("  expenses    List recent expenses");
    eprintln!("  profile     Show the signed-in profile");
    eprintln!("  login       Sign in and persist the session");
    eprintln!("  register    Create an account and sign in");
    eprintln!("  logout      Sign out and drop the persisted session");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_dir = pocketbook_core::config::Config::data_dir().ok();
    let _guard = init_tracing(log_dir);
    info!("Pocketbook CLI starting");

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("dashboard");

    let mut app = App::new()?;
    match command {
        "status" => app.status().await,
        "dashboard" => app.dashboard().await,
        "expenses" => app.expenses().await,
        "profile" => app.profile().await,
        "login" => app.login().await,
        "register" => app.register().await,
        "logout" => app.logout().await,
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            Ok(())
        }
    }
}
