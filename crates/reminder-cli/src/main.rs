//! Reminder CLI
//!
//! Command-line interface for the reminder service

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reminder_core::config::AppConfig;
use reminder_core::context::CallContext;
use reminder_core::logging_facility;
use reminder_engine::Services;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "reminder")]
#[command(about = "Reminder - time-bound todo tracking", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Abort the command after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init,
    /// Create an item
    Add(commands::items::AddArgs),
    /// Show one item
    Get(commands::items::IdArgs),
    /// Replace an item's description and optionally its completion state
    Update(commands::items::UpdateArgs),
    /// Mark an item completed
    Complete(commands::items::CompleteArgs),
    /// Mark an item open again
    Reopen(commands::items::IdArgs),
    /// Delete an item
    Delete(commands::items::IdArgs),
    /// List one page of items
    List(commands::list::ListArgs),
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    logging_facility::init(config.logging.profile);

    let services = Services::open(&config)?;
    let ctx = match cli.timeout_ms {
        Some(ms) => CallContext::background().with_timeout(Duration::from_millis(ms)),
        None => CallContext::background(),
    };

    let output = match cli.command {
        Commands::Init => commands::init::execute(&services, &config, &ctx)?,
        Commands::Add(args) => commands::items::add(&services, args, &ctx)?,
        Commands::Get(args) => commands::items::get(&services, args, &ctx)?,
        Commands::Update(args) => commands::items::update(&services, args, &ctx)?,
        Commands::Complete(args) => commands::items::complete(&services, args, &ctx)?,
        Commands::Reopen(args) => commands::items::reopen(&services, args, &ctx)?,
        Commands::Delete(args) => commands::items::delete(&services, args, &ctx)?,
        Commands::List(args) => commands::list::execute(&services, args, &ctx)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
