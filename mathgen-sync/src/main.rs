//! mathgen-sync - Mathematics Genealogy mirror
//!
//! Command-line front end of the sync engine:
//! - `name <LAST_NAME>` searches the remote site and stores every candidate
//! - `ids <ID>...` stores the given records and optionally walks their
//!   ancestors and descendants
//!
//! Exits non-zero when a fetch fails fatally (unknown identifier, unreachable
//! site, retries exhausted). An unresolvable name is a normal outcome.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mathgen_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use mathgen_sync::services::{Resolution, SyncEngine};
use mathgen_sync::utils::RetryPolicy;
use mathgen_sync::{Directions, GenealogyClient, PersonId, SearchHit, SyncMode};
use tracing::{error, info, warn};

const MODULE_NAME: &str = "mathgen-sync";

/// Command-line arguments for mathgen-sync
#[derive(Parser, Debug)]
#[command(name = "mathgen-sync")]
#[command(about = "Mirror the Mathematics Genealogy Project into a local database")]
#[command(version)]
struct Args {
    /// Root folder holding mathgen.db
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: ~/.config/mathgen/mathgen-sync.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file, instead of <root folder>/mathgen.db
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Genealogy site base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Attempts per record fetch before giving up
    #[arg(long, global = true)]
    max_fetch_attempts: Option<u32>,

    /// Log level for mathgen crates (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search by last name and store every candidate
    Name {
        last_name: String,

        /// List candidates from the search page only, store nothing
        #[arg(long)]
        preview: bool,
    },

    /// Store records by identifier
    Ids {
        #[arg(required = true)]
        ids: Vec<PersonId>,

        /// Also store all ancestors (advisors, recursively)
        #[arg(short, long)]
        ancestors: bool,

        /// Also store all descendants (students, recursively)
        #[arg(short, long)]
        descendants: bool,

        /// Re-fetch every descendant instead of skipping current subtrees
        #[arg(long)]
        naive: bool,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("mathgen_sync={level},mathgen_common={level}").into()
            }),
        )
        .init();
}

fn format_hit(hit: &SearchHit) -> String {
    let mut line = format!("{}: {}", hit.id, hit.name.as_deref().unwrap_or("(no name)"));
    if let Some(university) = &hit.university {
        line.push_str(&format!(", {}", university));
    }
    if let Some(year) = hit.year {
        line.push_str(&format!(" ({})", year));
    }
    line
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = RootFolderResolver::new(MODULE_NAME)
        .with_cli_override(args.root_folder.clone())
        .with_config_file(args.config.clone());

    // Config is read before tracing starts; its failure is logged afterwards
    let (toml_config, config_error) = match resolver.try_load_config() {
        Ok(config) => (config, None),
        Err(e) => (TomlConfig::default(), Some(e)),
    };

    init_tracing(args.log_level.as_deref().unwrap_or(&toml_config.logging.level));

    info!(
        "Starting mathgen-sync v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Some(e) = config_error {
        warn!("{}; continuing with compiled defaults", e);
    }

    let mut remote = toml_config
        .remote
        .clone()
        .with_env_overrides()
        .context("Invalid remote configuration")?;
    if let Some(base_url) = &args.base_url {
        remote.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(attempts) = args.max_fetch_attempts {
        remote.max_fetch_attempts = attempts;
    }
    remote.validate().context("Invalid remote configuration")?;

    let db_path = match &args.database {
        Some(path) => path.clone(),
        None => {
            let initializer = RootFolderInitializer::new(resolver.resolve_with_config(&toml_config));
            initializer
                .ensure_directory_exists()
                .context("Failed to initialize root folder")?;
            initializer.database_path()
        }
    };
    info!("Database path: {}", db_path.display());

    let pool = mathgen_sync::db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;

    let client = GenealogyClient::new(&remote).context("Failed to create HTTP client")?;
    info!(base_url = %client.base_url(), max_fetch_attempts = remote.max_fetch_attempts, "Remote source ready");

    let mode = match &args.command {
        Command::Ids { naive: true, .. } => SyncMode::Naive,
        _ => SyncMode::Smart,
    };
    let engine = SyncEngine::new(client, pool)
        .with_mode(mode)
        .with_retry_policy(RetryPolicy::from(&remote));

    let outcome = run(&engine, args.command, args.json).await;
    engine.pool().close().await;

    if let Err(e) = &outcome {
        error!("{:#}", e);
    }
    outcome
}

async fn run(engine: &SyncEngine<GenealogyClient>, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Name { last_name, preview } => {
            let resolution = engine
                .resolve_name(&last_name, preview)
                .await
                .with_context(|| format!("Name resolution for {:?} failed", last_name))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
                return Ok(());
            }

            match resolution {
                Resolution::Resolved(candidates) => {
                    for candidate in candidates {
                        println!("{}", candidate);
                    }
                }
                Resolution::Preview(hits) => {
                    for hit in &hits {
                        println!("{}", format_hit(hit));
                    }
                }
                Resolution::Unresolvable(reason) => println!("{}", reason.guidance()),
            }
        }

        Command::Ids {
            ids,
            ancestors,
            descendants,
            ..
        } => {
            let directions = Directions {
                ancestors,
                descendants,
            };

            let report = engine
                .sync_ids(&ids, directions)
                .await
                .context("Synchronization failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.display_string());
            }
        }
    }

    Ok(())
}
