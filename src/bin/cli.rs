//! Flat Directory CLI
//!
//! One-shot entry point: every invocation loads the configuration, runs one
//! command and exits.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use flatdir::{
    error::{AppError, Result},
    models::{Ad, Config},
    pipeline::Directory,
};

/// Flat Directory - aggregate flat ads from real estate companies
#[derive(Parser, Debug)]
#[command(
    name = "flatdir",
    version,
    about = "Aggregate flat ads from different real estate companies"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "flatdir.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and store the current ads of all companies
    Update,

    /// Print the stored ads
    Ads {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show per-company ad counts and liveness
    Status,

    /// Validate the configuration file
    Validate,

    /// Write the stored ads to a JSON file
    Export {
        #[arg(short, long, default_value = "ads.json")]
        output: PathBuf,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(AppError::config(format!(
            "Config file not found at {}",
            path.display()
        )));
    }
    let config = Config::load(path)?;
    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn print_ads(directory: &Directory, ads: &[Ad]) {
    for ad in ads {
        println!(
            "{} | {} | {} rooms | {:.2} {} | since {} | {}",
            ad.title(),
            ad.location(),
            ad.rooms(),
            ad.rent(),
            directory.currency(),
            ad.first_seen().format("%Y-%m-%d %H:%M"),
            ad.url()
        );
    }
}

/// Main entry point for the CLI application.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Update => {
            let directory = Directory::from_config(&config)?;
            log::info!("Updating {} companies...", config.sources.len());

            let outcome = directory.update(Utc::now());
            log::info!(
                "Stored {} ad(s) from {} companies, {} failed",
                outcome.ad_count(),
                outcome.updated.len(),
                outcome.failures.len()
            );
        }

        Command::Ads { json } => {
            let directory = Directory::from_config(&config)?;
            let ads = directory.ads()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ads)?);
            } else {
                print_ads(&directory, &ads);
            }
        }

        Command::Status => {
            let directory = Directory::from_config(&config)?;
            let now = Utc::now();
            println!("{}", directory.title());
            println!("{}", directory.description());
            for source in directory.sources() {
                let state = if source.is_ok(now)? { "online" } else { "offline" };
                println!("{} {} ad(s) {}", source.host(), source.ads()?.len(), state);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} companies, all field paths parse)", config.sources.len());
        }

        Command::Export { output } => {
            let directory = Directory::from_config(&config)?;
            let ads = directory.ads()?;
            std::fs::write(&output, serde_json::to_string_pretty(&ads)?)?;
            log::info!("Exported {} ad(s) to {}", ads.len(), output.display());
        }
    }

    Ok(())
}
