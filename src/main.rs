//! Iskonawa CLI - loads the verb dictionary into the document store

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use iskonawa::config::{self, AppConfig, StoreConfig};
use iskonawa::crud;
use iskonawa::storage::{DocumentStore, SqliteStore, StoreStats};
use iskonawa::ui::{self, Icons, Spinner};
use iskonawa::{Dataset, Ingestor};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "iskonawa")]
#[command(version)]
#[command(about = "Loads the Iskonawa verb dictionary and its references into a document database")]
#[command(long_about = r#"
Loads the Iskonawa verb dataset into MongoDB, rewriting each verb's
reference keys to the identifiers of the inserted reference documents.

Credentials come from MONGO_USERNAME, MONGO_PASSWORD and MONGO_CLUSTER_URL
(a .env file in the working directory is read if present).

Example usage:
  iskonawa ping
  iskonawa ingest --references json/isc_references.json --verbs json/isc_verbs_data.json
  iskonawa smoke
  iskonawa stats --sqlite iskonawa.db
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the project config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct StoreArgs {
    /// Use a local SQLite document store instead of MongoDB
    #[arg(long, value_name = "PATH")]
    sqlite: Option<PathBuf>,

    /// Database name (defaults to the config file, then iskonawa_db)
    #[arg(long)]
    database: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the store is reachable and list its databases
    Ping {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Drop both collections and load references and verbs
    Ingest {
        /// Reference dataset (JSON array)
        #[arg(short, long)]
        references: Option<PathBuf>,

        /// Verb dataset (JSON array)
        #[arg(short = 'b', long)]
        verbs: Option<PathBuf>,

        /// Keep existing documents instead of dropping the collections
        #[arg(long)]
        keep_existing: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Run insert/read/update/delete checks against the verbs collection
    Smoke {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show document counts per collection
    Stats {
        #[command(flatten)]
        store: StoreArgs,
    },
}

enum Backend {
    Sqlite(SqliteStore),
    #[cfg(feature = "mongo")]
    Mongo(iskonawa::MongoStore),
}

macro_rules! with_store {
    ($backend:expr, $store:ident => $body:expr) => {
        match $backend {
            Backend::Sqlite($store) => $body,
            #[cfg(feature = "mongo")]
            Backend::Mongo($store) => $body,
        }
    };
}

fn open_store(args: &StoreArgs, app: &AppConfig) -> anyhow::Result<Backend> {
    if let Some(path) = &args.sqlite {
        tracing::info!("Opening SQLite store at {}", path.display());
        return Ok(Backend::Sqlite(SqliteStore::open(path)?));
    }

    let database = args.database.as_deref().unwrap_or_else(|| app.database());
    let store_config = StoreConfig::from_env(database)?;
    connect_mongo(&store_config)
}

#[cfg(feature = "mongo")]
fn connect_mongo(store_config: &StoreConfig) -> anyhow::Result<Backend> {
    tracing::info!("Connecting to {}", store_config);
    Ok(Backend::Mongo(iskonawa::MongoStore::connect(store_config)?))
}

#[cfg(not(feature = "mongo"))]
fn connect_mongo(_store_config: &StoreConfig) -> anyhow::Result<Backend> {
    anyhow::bail!("built without MongoDB support; pass --sqlite <PATH>")
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let app = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Ping { store } => {
            // Diagnostic only: a failure is reported, not propagated
            let spinner = Spinner::new("Connecting...");
            let result = open_store(&store, &app)
                .and_then(|backend| Ok(with_store!(backend, s => s.list_databases()?)));
            spinner.finish_and_clear();

            match result {
                Ok(names) => {
                    ui::success("Connected to the store");
                    ui::info("Databases", &names.join(", "));
                }
                Err(e) => ui::error(&format!("Could not connect to the store: {:#}", e)),
            }
        }

        Commands::Ingest { references, verbs, keep_existing, store } => {
            let references = references.unwrap_or_else(|| app.references_path());
            let verbs = verbs.unwrap_or_else(|| app.verbs_path());

            ui::header(Icons::INGEST, "Ingesting Iskonawa verbs");
            ui::info("References", &references.display().to_string());
            ui::info("Verbs", &verbs.display().to_string());

            let dataset = Dataset::load(&references, &verbs)?;
            ui::summary_row(
                "Loaded:",
                &format!(
                    "{} references, {} verbs, {} inflected forms",
                    dataset.references.len(),
                    dataset.verbs.len(),
                    dataset.inflected_form_count()
                ),
            );

            if keep_existing {
                ui::warn("Keeping existing documents; earlier loads will be duplicated");
            }

            let backend = open_store(&store, &app)?;
            let spinner = Spinner::new("Writing references and verbs...");
            let stats = with_store!(backend, s => {
                let ingestor = Ingestor::new(&s);
                let ingestor = if keep_existing { ingestor.keep_existing() } else { ingestor };
                ingestor.run(dataset)
            });
            let stats = match stats {
                Ok(stats) => stats,
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e.into());
                }
            };
            spinner.finish_with_message(&format!("{} References resolved", Icons::RESOLVED));

            ui::section("Summary");
            print!("{}", stats);
            ui::success("Data inserted successfully!");
        }

        Commands::Smoke { store } => {
            let backend = open_store(&store, &app)?;
            ui::section("CRUD checks");
            let outcomes = with_store!(backend, s => crud::run_all(&s)?);

            let mut failed = 0;
            for (check, outcome) in &outcomes {
                match outcome {
                    Ok(()) => ui::check_passed(check.as_str()),
                    Err(e) => {
                        failed += 1;
                        ui::check_failed(check.as_str(), &e.to_string());
                    }
                }
            }

            if failed > 0 {
                anyhow::bail!("{} of {} CRUD checks failed", failed, outcomes.len());
            }
            ui::success(&format!("All {} CRUD checks passed", outcomes.len()));
        }

        Commands::Stats { store } => {
            let backend = open_store(&store, &app)?;
            let stats: StoreStats = with_store!(backend, s => StoreStats::collect(&s)?);

            ui::header(Icons::STORE, "Iskonawa store");
            println!("{}", ui::stats_table(&stats));
        }
    }

    Ok(())
}
