//! # PhD Summary CLI (`phd-summary`)
//!
//! Runs the chapter HTTP server and offers a few read-only commands for
//! inspecting the chapter database from a shell.
//!
//! ## Usage
//!
//! ```bash
//! phd-summary --config ./config/phd-summary.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `phd-summary init` | Create the SQLite database and the chapters table |
//! | `phd-summary serve` | Start the HTTP server |
//! | `phd-summary get <id>` | Print one chapter as JSON |
//! | `phd-summary list` | Print all chapters as JSON |
//! | `phd-summary tags` | Print the distinct tags, one per line |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phd_summary::{chapters, config, migrate, server};

/// PhD summary chapter service.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "phd-summary",
    about = "Chapter service for PhD summaries",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/phd-summary.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `chapters` table. Running
    /// it again is harmless.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Print one chapter as JSON.
    Get {
        /// Chapter id.
        id: String,
    },

    /// Print every chapter as a JSON array.
    List,

    /// Print the distinct tags used across all chapters.
    Tags,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("phd_summary=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Get { id } => {
            chapters::run_get(&cfg, &id).await?;
        }
        Commands::List => {
            chapters::run_list(&cfg).await?;
        }
        Commands::Tags => {
            chapters::run_tags(&cfg).await?;
        }
    }

    Ok(())
}
