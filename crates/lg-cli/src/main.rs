use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lg_cli::commands::{chart, regions, stats};
use lg_cli::{Cli, Commands, Config};

/// Load config and open the lodging log.
fn open_database(config_path: Option<&Path>) -> Result<(lg_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if !config.database_path.exists() {
        anyhow::bail!(
            "lodging log not found at {} (set database_path or LG_DATABASE_PATH)",
            config.database_path.display()
        );
    }

    let db = lg_db::Database::open(&config.database_path).with_context(|| {
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
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Chart {
            output,
            stats: stats_output,
            range,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            chart::run(
                &mut out,
                &db,
                &config,
                output,
                stats_output.as_deref(),
                *range,
            )?;
        }
        Some(Commands::Stats { range, limit, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            stats::run(&mut out, &db, *range, *limit, *json)?;
        }
        Some(Commands::Regions { json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            regions::run(&mut out, &db, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    out.flush()?;
    Ok(())
}
