#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the equipment inventory importer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fleet_cli_utils::IndicatifProgress;
use fleet_database::machines::MACHINES_COLLECTION;
use fleet_database::paths::default_db_path;

#[derive(Parser)]
#[command(name = "fleet_ingest", about = "Equipment inventory sheet importer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract machines from an OCR text file and replace the collection
    Import {
        /// OCR text file with page markers
        file: PathBuf,
        /// Extraction profile (TOML). Defaults to the built-in profile
        #[arg(long)]
        profile: Option<PathBuf>,
        /// `DuckDB` file (default: `$FLEET_DB_PATH`, then `data/fleet.duckdb`)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Target collection
        #[arg(long, default_value = MACHINES_COLLECTION)]
        collection: String,
        /// Extract and report without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// List the machines stored in a collection
    List {
        /// `DuckDB` file (default: `$FLEET_DB_PATH`, then `data/fleet.duckdb`)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Collection to list
        #[arg(long, default_value = MACHINES_COLLECTION)]
        collection: String,
    },
    /// Show the category the built-in rules assign to a model
    Classify {
        /// Model or type designation (e.g., "GS-3246")
        model: String,
        /// Manufacturer, used when no model rule matches
        #[arg(long, default_value = "")]
        manufacturer: String,
    },
    /// Print the built-in classification rules in evaluation order
    Rules,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = fleet_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return fleet_ingest::interactive::run(&multi);
    };

    match command {
        Commands::Import {
            file,
            profile,
            db,
            collection,
            dry_run,
        } => {
            let db = db.unwrap_or_else(default_db_path);
            let progress = IndicatifProgress::pages_bar(&multi, "Extracting pages");
            fleet_ingest::run_import(
                &file,
                profile.as_deref(),
                &db,
                &collection,
                dry_run,
                &progress,
            )?;
        }
        Commands::List { db, collection } => {
            let db = db.unwrap_or_else(default_db_path);
            fleet_ingest::run_list(&db, &collection)?;
        }
        Commands::Classify {
            model,
            manufacturer,
        } => fleet_ingest::print_classification(&model, &manufacturer),
        Commands::Rules => fleet_ingest::print_rules(),
    }

    Ok(())
}
