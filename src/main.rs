//! # Lost & Found CLI (`lf`)
//!
//! ## Usage
//!
//! ```bash
//! lf --config ./config/lf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lf init` | Create the SQLite database and run schema migrations |
//! | `lf report <lost\|found>` | File a new report |
//! | `lf list <lost\|found>` | List a report collection |
//! | `lf match` | Rank candidate pairings between lost and found reports |
//! | `lf user add` / `lf user get` | Register or look up a user |
//! | `lf serve` | Start the JSON HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lostfound::models::{Coordinates, NewReport, ReportKind};
use lostfound::{config, logging, matches, migrate, reports, server, users};

/// Lost & Found CLI: file lost and found reports and find likely matches.
#[derive(Parser)]
#[command(
    name = "lf",
    about = "Lost & Found: file lost and found item reports and rank likely matches",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// File a new lost or found report.
    Report {
        /// `lost` or `found`.
        kind: ReportKind,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Human-readable location, e.g. "Main Library".
        #[arg(long)]
        location: String,

        /// Id of the user filing the report.
        #[arg(long)]
        reporter: String,

        /// Latitude in degrees (requires --lon).
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in degrees (requires --lat).
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Reference to an attached image.
        #[arg(long)]
        image: Option<String>,

        #[arg(long)]
        contact_name: Option<String>,

        #[arg(long)]
        contact_email: Option<String>,

        #[arg(long)]
        contact_phone: Option<String>,
    },

    /// List all reports of one kind.
    List {
        /// `lost` or `found`.
        kind: ReportKind,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Rank candidate pairings between lost and found reports.
    Match {
        /// Maximum number of candidates (defaults to `[matching].limit`).
        #[arg(long)]
        limit: Option<usize>,

        /// Ignore name/description overlap when either side is empty.
        #[arg(long)]
        strict: bool,

        /// Show which signals fired for each candidate.
        #[arg(long)]
        explain: bool,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Start the JSON HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new user.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Look up a user by email.
    Get { email: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging.level)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Report {
            kind,
            name,
            description,
            location,
            reporter,
            lat,
            lon,
            image,
            contact_name,
            contact_email,
            contact_phone,
        } => {
            let coordinates = match (lat, lon) {
                (Some(latitude), Some(longitude)) => Some(Coordinates {
                    latitude,
                    longitude,
                }),
                _ => None,
            };
            let new = NewReport {
                name,
                description,
                location,
                coordinates,
                reporter_id: reporter,
                image_reference: image,
                contact_name,
                contact_email,
                contact_phone,
            };
            reports::run_report(&cfg, kind, new).await?;
        }
        Commands::List { kind, json } => {
            reports::run_list(&cfg, kind, json).await?;
        }
        Commands::Match {
            limit,
            strict,
            explain,
            json,
        } => {
            if limit == Some(0) {
                anyhow::bail!("--limit must be >= 1");
            }
            let params = cfg.matching.params(limit, strict, explain);
            matches::run_match(&cfg, &params, json).await?;
        }
        Commands::User { action } => match action {
            UserAction::Add { name, email } => {
                users::run_add(&cfg, &name, &email).await?;
            }
            UserAction::Get { email } => {
                users::run_get(&cfg, &email).await?;
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
