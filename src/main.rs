//! # Marathon Quals CLI (`mq`)
//!
//! Scrapes marathon qualifying standards into SQLite and answers "do I
//! qualify?" against them.
//!
//! ## Usage
//!
//! ```bash
//! mq --config ./config/mq.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mq init` | Create the SQLite database and schema |
//! | `mq sources` | List race adapters, URLs and race-year policies |
//! | `mq sync <all\|name>` | Fetch, normalize and reconcile qualifying tables |
//! | `mq check` | Standard and margin for one runner |
//! | `mq top --location L` | Qualifying times ranked fastest first |
//! | `mq classify --age A --location L` | A race's age-group label for an age |
//! | `mq parse-time "<text>"` | Show how a time string normalizes |
//!
//! ## Examples
//!
//! ```bash
//! mq init
//! mq sync all
//! mq sync boston --dry-run
//! mq check --age 42 --gender women --location Boston --pb 3:35:30
//! mq top --location London --gender men --limit 5
//! RUST_LOG=debug mq sync chicago
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use marathon_quals::config;
use marathon_quals::ingest;
use marathon_quals::migrate;
use marathon_quals::report::{self, CheckArgs};
use marathon_quals::sources;
use marathon_quals_core::models::Gender;

/// Marathon Quals: scrape, normalize and query marathon qualifying times.
///
/// Commands that touch the database read a TOML config given by
/// `--config`. See `config/mq.example.toml`.
#[derive(Parser)]
#[command(
    name = "mq",
    about = "Marathon qualifying times: scrape, normalize, reconcile and query",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// List race adapters and their configured state.
    Sources,

    /// Scrape and store qualifying times.
    ///
    /// Each source is fetched and reconciled on its own; a source that fails
    /// is reported and the rest still run.
    Sync {
        /// `all` or an adapter name (`boston`, `london`, `tokyo`,
        /// `new_york`, `chicago`, `berlin`).
        source: String,

        /// Parse and normalize without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Look up the standard for a runner and their margin against it.
    ///
    /// Flags left out fall back to the `[runner]` table in config.
    Check {
        #[arg(long)]
        age: Option<u32>,

        /// `women` or `men`.
        #[arg(long)]
        gender: Option<Gender>,

        #[arg(long)]
        location: Option<String>,

        /// Personal best, in any format the normalizer accepts.
        #[arg(long = "pb")]
        personal_best: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List qualifying times for a location, fastest first.
    Top {
        #[arg(long)]
        location: String,

        /// Only this exact age-group label.
        #[arg(long)]
        age_group: Option<String>,

        #[arg(long, default_value = "women")]
        gender: Gender,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Print the age-group label a race uses for an age.
    Classify {
        #[arg(long)]
        age: u32,

        #[arg(long)]
        location: String,
    },

    /// Show how a time string normalizes.
    ParseTime {
        text: String,

        /// Read two-part times like `3:30` as minutes and seconds.
        #[arg(long)]
        minutes_seconds: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let load = || config::load_config(&cli.config);

    match &cli.command {
        Commands::Init => {
            migrate::run_migrations(&load()?).await?;
            println!("initialized");
        }
        Commands::Sources => {
            sources::list_sources(&load()?)?;
        }
        Commands::Sync { source, dry_run } => {
            ingest::run_sync(&load()?, source, *dry_run).await?;
        }
        Commands::Check {
            age,
            gender,
            location,
            personal_best,
            json,
        } => {
            let args = CheckArgs {
                age: *age,
                gender: *gender,
                location: location.clone(),
                personal_best: personal_best.clone(),
            };
            report::run_check(&load()?, &args, *json).await?;
        }
        Commands::Top {
            location,
            age_group,
            gender,
            limit,
            json,
        } => {
            report::run_top(&load()?, location, age_group.as_deref(), *gender, *limit, *json)
                .await?;
        }
        // No config needed
        Commands::Classify { age, location } => report::run_classify(*age, location)?,
        Commands::ParseTime {
            text,
            minutes_seconds,
        } => report::run_parse_time(text, *minutes_seconds)?,
    }

    Ok(())
}
