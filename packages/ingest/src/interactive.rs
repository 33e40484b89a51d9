#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the fleet ingest tool.
//!
//! Runs when `fleet_ingest` is started without a subcommand, so imports can
//! be done without remembering flags.

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Select};
use fleet_cli_utils::{IndicatifProgress, MultiProgress};
use fleet_database::machines::MACHINES_COLLECTION;
use fleet_database::paths::default_db_path;

/// Top-level actions available in the interactive menu.
enum IngestAction {
    Import,
    ListMachines,
    Classify,
    ShowRules,
}

impl IngestAction {
    const ALL: &[Self] = &[
        Self::Import,
        Self::ListMachines,
        Self::Classify,
        Self::ShowRules,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Import => "Import an OCR text file",
            Self::ListMachines => "List imported machines",
            Self::Classify => "Classify a model",
            Self::ShowRules => "Show classification rules",
        }
    }
}

/// Prompts for an action and runs it against the default database.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = IngestAction::ALL.iter().map(IngestAction::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let db = default_db_path();

    match IngestAction::ALL[idx] {
        IngestAction::Import => import(multi, &db)?,
        IngestAction::ListMachines => crate::run_list(&db, MACHINES_COLLECTION)?,
        IngestAction::Classify => {
            let model: String = Input::new().with_prompt("Model").interact_text()?;
            let manufacturer: String = Input::new()
                .with_prompt("Manufacturer (optional)")
                .allow_empty(true)
                .interact_text()?;
            crate::print_classification(&model, &manufacturer);
        }
        IngestAction::ShowRules => crate::print_rules(),
    }

    Ok(())
}

fn import(multi: &MultiProgress, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file: String = Input::new()
        .with_prompt("OCR text file")
        .interact_text()?;
    let profile: String = Input::new()
        .with_prompt("Extraction profile (empty for default)")
        .allow_empty(true)
        .interact_text()?;
    let dry_run = Confirm::new()
        .with_prompt(format!("Dry run (do not write to {})?", db.display()))
        .default(false)
        .interact()?;

    let profile = (!profile.trim().is_empty()).then(|| PathBuf::from(profile.trim()));
    let progress = IndicatifProgress::pages_bar(multi, "Extracting pages");

    crate::run_import(
        Path::new(file.trim()),
        profile.as_deref(),
        db,
        MACHINES_COLLECTION,
        dry_run,
        &progress,
    )?;

    Ok(())
}
