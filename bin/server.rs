// Expense Tracker - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use expense_tracker::config::{Config, StorageBackend, DEFAULT_CONFIG_FILE};
use expense_tracker::server::{router, AppState};
use expense_tracker::{logging, open_storage, ExpenseStore};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "expense-server", about = "HTTP API for the expense tracker")]
struct ServerArgs {
    /// Path to config file
    #[arg(short, long, env = "EXPENSE_TRACKER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// SQLite database file (overrides config file)
    #[arg(long, env = "EXPENSE_TRACKER_DB")]
    db: Option<PathBuf>,

    /// Keep everything in memory (overrides config file)
    #[arg(long)]
    memory: bool,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(db) = args.db {
        config.storage.path = db;
    }
    if args.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    logging::init(&config.logging);

    let storage = open_storage(&config.storage).context("Failed to open storage")?;
    let store = ExpenseStore::new(storage).context("Failed to initialize expense store")?;
    let app = router(AppState::new(store));

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "🚀 Server running");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/expenses", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
