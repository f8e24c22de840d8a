//! `bo-persist` command-line entrypoint.
//!
//! Reads the same environment as the library (`BO_STORE`, `DATABASE_URL`,
//! `DB_MAX_CONNECTIONS`, `BO_SCHEMA_PATH`, optionally from `.env`).

use bo_persist::infra::config::{StoreConfig, StoreKind};
use bo_persist::infra::logging;
use bo_persist::{ClassDefRegistry, DataAccessor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bo-persist",
    about = "Business-object persistence tooling",
    version
)]
struct Cli {
    /// Class definition file; overrides BO_SCHEMA_PATH
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CREATE TABLE statements for every registered class
    SchemaSql,

    /// Connect to the configured store and create any missing tables
    Preflight,

    /// Take the next number of a sequence and save it
    NextNumber {
        #[arg(long)]
        number_type: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = StoreConfig::from_env()?;
    if let Some(schema) = cli.schema {
        config.schema_path = Some(schema);
    }

    match cli.command {
        Commands::SchemaSql => {
            let registry = match &config.schema_path {
                Some(path) => ClassDefRegistry::from_file(path)?,
                None => ClassDefRegistry::builder().build()?,
            };
            for sql in registry.get_all_create_table_sql() {
                println!("{};", sql);
            }
        }
        Commands::Preflight => {
            println!("> Preflight:");
            println!("  store={}", store_label(&config));
            println!("  max_connections={}", config.max_connections);
            let accessor = DataAccessor::from_config(&config).await?;
            println!("  Store '{}' reachable, schema ensured.", accessor.store().name());
            for class in accessor.registry().list_classes() {
                println!("  class {}", class);
            }
            println!("> Preflight OK.");
        }
        Commands::NextNumber { number_type } => {
            let accessor = DataAccessor::from_config(&config).await?;
            let mut generator = accessor.number_generator(&number_type).await?;
            let number = generator.next_number()?;
            generator.save().await?;
            println!("{}", number);
        }
    }
    Ok(())
}

/// Store kind without the connection string, which may carry credentials.
fn store_label(config: &StoreConfig) -> &'static str {
    match config.kind {
        StoreKind::Memory => "memory",
        StoreKind::Postgres { .. } => "postgres",
    }
}
