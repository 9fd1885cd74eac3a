use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use grind_cli::commands::{export, report, run, status, sync};
use grind_cli::{Cli, Commands, Config};
use grind_core::{Clock, SessionEngine, SystemClock};
use grind_db::{DailyAggregateStore, SqlitePersistence, load_history};

/// Load config and open storage, ensuring the parent directory exists.
fn open_persistence(config_path: Option<&Path>) -> Result<(SqlitePersistence, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = SqlitePersistence::open(&config.database_path).with_context(|| {
        format!("failed to open {}", config.database_path.display())
    })?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so they never mix with command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let result = runtime.block_on(dispatch(cli));
    // A stdin read left blocked after `quit` must not hold up exit
    runtime.shutdown_background();
    result
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Run { live }) => {
            let (db, config) = open_persistence(cli.config.as_deref())?;
            let categories = config.categories()?;
            let store = DailyAggregateStore::load(Arc::new(db)).await;
            let mut engine = SessionEngine::new(
                SystemClock::new(),
                store,
                categories.default_category().clone(),
            )
            .with_categories(categories.list().iter().cloned());

            let tick = live.then(|| config.tick_interval());
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            run::run(&mut engine, &categories, input, &mut stdout, tick).await?;
        }
        Some(Commands::Report { month, json }) => {
            let (db, config) = open_persistence(cli.config.as_deref())?;
            let categories = config.categories()?;
            let history = load_history(&db).await;
            report::run(&mut stdout, &history, &categories, month.as_deref(), *json)?;
        }
        Some(Commands::Status) => {
            let (db, config) = open_persistence(cli.config.as_deref())?;
            let today = SystemClock::new().today();
            status::run(&mut stdout, &config, &db, today).await?;
        }
        Some(Commands::Export) => {
            let (db, _config) = open_persistence(cli.config.as_deref())?;
            let history = load_history(&db).await;
            export::run(&mut stdout, &history)?;
        }
        Some(Commands::Sync) => {
            // Sync needs no storage; it only reports that it is unavailable
            sync::run()?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
