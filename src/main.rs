//! # RegWatch CLI
//!
//! Compliance expiry notifications over email and WhatsApp.
//!
//! Usage:
//!   regwatch serve                       # HTTP trigger on the configured port
//!   regwatch run                         # One scheduled run, summary to stdout
//!   regwatch run --manual --date 2026-03-10
//!   regwatch init-db                     # Create database tables
//!   regwatch deliveries --limit 20       # Recent delivery attempts

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use regwatch_core::RegWatchConfig;
use regwatch_core::traits::ComplianceStore;
use regwatch_dispatch::{Invocation, RunCoordinator};
use regwatch_gateway::{AppState, GatewayServer};
use regwatch_store::SqliteStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "regwatch",
    version,
    about = "RegWatch: compliance expiry notifications",
    long_about = "Sends due reminders, upcoming-expiry warnings and overdue notices\nfor compliance parameters over email and WhatsApp."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP run trigger
    Serve {
        /// Override bind host
        #[arg(long)]
        host: Option<String>,

        /// Override bind port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Execute one run and print its summary
    Run {
        /// Manual test run: re-processes reminders already marked sent
        #[arg(short, long)]
        manual: bool,

        /// Reference date for a manual run (YYYY-MM-DD)
        #[arg(long, requires = "manual")]
        date: Option<NaiveDate>,
    },

    /// Create the database schema (and a default config file if none exists)
    InitDb,

    /// Show recent delivery attempts
    Deliveries {
        /// Number of rows to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        "regwatch=debug,regwatch_core=debug,regwatch_channels=debug,regwatch_dispatch=debug,regwatch_store=debug,regwatch_gateway=debug,tower_http=debug"
    } else {
        "regwatch=info,regwatch_channels=info,regwatch_dispatch=info,regwatch_gateway=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&str>) -> Result<RegWatchConfig> {
    let config = match path {
        Some(p) => RegWatchConfig::load_from(Path::new(shellexpand::tilde(p).as_ref()))?,
        None => RegWatchConfig::load()?,
    };
    Ok(config)
}

fn open_store(config: &RegWatchConfig) -> Result<Arc<SqliteStore>> {
    let path = config.db_path();
    let store = SqliteStore::open(&path)?;
    tracing::debug!("Using database {}", path.display());
    Ok(Arc::new(store))
}

fn build_coordinator(config: RegWatchConfig, store: Arc<dyn ComplianceStore>) -> RunCoordinator {
    let senders = regwatch_channels::create_senders(&config);
    RunCoordinator::new(config, store, senders)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(h) = host {
                config.gateway.host = h;
            }
            if let Some(p) = port {
                config.gateway.port = p;
            }
            config.validate()?;

            let store = open_store(&config)?;
            let gateway_config = config.gateway.clone();
            let coordinator = build_coordinator(config, store.clone());
            let state = AppState::new(Arc::new(coordinator), store);
            GatewayServer::new(gateway_config, state).start().await?;
        }

        Commands::Run { manual, date } => {
            let store = open_store(&config)?;
            let coordinator = build_coordinator(config, store);

            let mut invocation = if manual { Invocation::manual_test() } else { Invocation::scheduled() };
            if let Some(d) = date {
                invocation = invocation.with_reference_date(d);
            }

            let summary = coordinator.run(&invocation).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if summary.is_degraded() {
                tracing::warn!("Run completed with errors; see summary");
            }
        }

        Commands::InitDb => {
            let path = config.db_path();
            let store = SqliteStore::open(&path)?;
            let (parameters, reminders, deliveries) = store.stats()?;
            println!("Database ready: {}", path.display());
            println!("  {parameters} parameter(s), {reminders} reminder(s), {deliveries} delivery log row(s)");

            let config_path = RegWatchConfig::default_path();
            if cli.config.is_none() && !config_path.exists() {
                RegWatchConfig::default().save_to(&config_path)?;
                println!("Default config written to {}", config_path.display());
            }
        }

        Commands::Deliveries { limit } => {
            let store = open_store(&config)?;
            let rows = store.recent_deliveries(limit).await?;
            if rows.is_empty() {
                println!("No delivery attempts recorded.");
            }
            for row in rows {
                println!(
                    "{}  {:<8} {:<7} {:<14} {:<20} {}{}",
                    row.created_at.format("%Y-%m-%d %H:%M:%S"),
                    row.channel.as_str(),
                    row.status.as_str(),
                    row.event.kind.as_str(),
                    row.event.source_id,
                    row.recipient,
                    row.error.map(|e| format!("  ({e})")).unwrap_or_default(),
                );
            }
        }
    }

    Ok(())
}
