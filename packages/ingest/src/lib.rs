#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Imports OCR'd equipment inventory sheets into a document collection.
//!
//! An import runs the extraction pipeline over one OCR text file and then
//! replaces the target collection with the extracted machine records.

pub mod interactive;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fleet_database::machines::{machine_document, machine_from_document, machine_schema};
use fleet_database::{CollectionSink, Document, DuckDbCollections, replace_collection};
use fleet_equipment_models::MachineRecord;
use fleet_ocr::assemble::{IdGenerator, UuidV4Ids};
use fleet_ocr::classify::{Classifier, PatternKind, RuleScope};
use fleet_ocr::profile::ExtractionProfile;
use fleet_ocr::progress::ProgressCallback;
use fleet_ocr::{OcrError, Pipeline};

/// Errors that can occur during an import.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Invalid extraction profile.
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] fleet_database::DbError),

    /// The OCR text file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Listing was asked for a database file that does not exist.
    #[error("No database at {path}")]
    MissingDatabase { path: String },
}

/// Outcome of one import.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub pages: usize,
    pub pages_without_data: usize,
    pub incomplete_columns: usize,
    pub dropped_columns: usize,
    /// Records extracted.
    pub records: usize,
    /// Documents written to the sink (zero on a dry run).
    pub written: u64,
    /// Record count per category group.
    pub by_group: BTreeMap<String, usize>,
    pub elapsed: Duration,
}

/// Loads the profile at `path`, or the built-in default profile.
///
/// # Errors
///
/// Returns [`IngestError::Ocr`] if the file cannot be read or parsed.
pub fn load_profile(path: Option<&Path>) -> Result<ExtractionProfile, IngestError> {
    Ok(path.map_or_else(
        || Ok(ExtractionProfile::default()),
        ExtractionProfile::load,
    )?)
}

/// Extracts machine records from `text` and, unless `sink` is `None`
/// (dry run), replaces `collection` with them.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if writing to the sink fails.
pub fn import_text(
    text: &str,
    pipeline: &Pipeline,
    sink: Option<&mut dyn CollectionSink>,
    collection: &str,
    ids: &mut dyn IdGenerator,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<(ImportSummary, Vec<MachineRecord>), IngestError> {
    let start = Instant::now();
    let extraction = pipeline.run(text, ids, progress);

    let mut summary = ImportSummary {
        pages: extraction.pages,
        pages_without_data: extraction.pages_without_data,
        incomplete_columns: extraction.incomplete_columns,
        dropped_columns: extraction.dropped_columns,
        records: extraction.records.len(),
        ..ImportSummary::default()
    };
    for record in &extraction.records {
        *summary
            .by_group
            .entry(record.category_group.clone())
            .or_default() += 1;
    }

    if let Some(sink) = sink {
        let documents = extraction
            .records
            .iter()
            .map(machine_document)
            .collect::<Result<Vec<Document>, _>>()?;
        summary.written = replace_collection(sink, collection, &machine_schema(), &documents)?;
    } else {
        log::info!(
            "Dry run: {} record(s) not written to {collection:?}",
            summary.records
        );
    }

    summary.elapsed = start.elapsed();
    Ok((summary, extraction.records))
}

/// Reads an OCR text file and imports it; see [`import_text`].
///
/// # Errors
///
/// Returns [`IngestError::Read`] if the file cannot be read, or any error
/// from [`import_text`].
pub fn import_file(
    path: &Path,
    pipeline: &Pipeline,
    sink: Option<&mut dyn CollectionSink>,
    collection: &str,
    ids: &mut dyn IdGenerator,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<(ImportSummary, Vec<MachineRecord>), IngestError> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Importing {} ({} bytes)", path.display(), text.len());

    import_text(text.as_str(), pipeline, sink, collection, ids, progress)
}

/// Reads every machine record stored in `collection`.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if the collection is missing or a document
/// is not a machine record.
pub fn load_machines(
    sink: &dyn CollectionSink,
    collection: &str,
) -> Result<Vec<MachineRecord>, IngestError> {
    let mut machines = sink
        .list(collection)?
        .iter()
        .map(machine_from_document)
        .collect::<Result<Vec<_>, _>>()?;
    machines.sort_by(|a, b| {
        a.source_page
            .cmp(&b.source_page)
            .then_with(|| a.inventory_number.cmp(&b.inventory_number))
    });
    Ok(machines)
}

/// Prints a fixed-width table of machines to stdout.
pub fn print_machines(machines: &[MachineRecord]) {
    println!(
        "{:<12} {:<32} {:<22} {:<10} PAGE",
        "INVENTORY", "NAME", "GROUP", "STATUS"
    );
    println!("{}", "-".repeat(84));
    for machine in machines {
        println!(
            "{:<12} {:<32} {:<22} {:<10} {}",
            machine.inventory_number,
            machine.display_name,
            machine.category_group,
            machine.status,
            machine.source_page
        );
    }
}

/// Logs an [`ImportSummary`].
pub fn log_summary(summary: &ImportSummary) {
    log::info!(
        "Import complete: {} record(s) from {} page(s), {} written in {:.1}s",
        summary.records,
        summary.pages,
        summary.written,
        summary.elapsed.as_secs_f64()
    );
    if summary.incomplete_columns > 0 {
        log::warn!(
            "{} column(s) had no manufacturer or model ({} dropped)",
            summary.incomplete_columns,
            summary.dropped_columns
        );
    }
    for (group, count) in &summary.by_group {
        log::info!("  {group}: {count}");
    }
}

/// Runs a full import of `file` into the `DuckDB` database at `db`.
///
/// With `dry_run` the database is not opened at all.
///
/// # Errors
///
/// Returns [`IngestError`] if the profile, the input file or the database
/// fails.
pub fn run_import(
    file: &Path,
    profile: Option<&Path>,
    db: &Path,
    collection: &str,
    dry_run: bool,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ImportSummary, IngestError> {
    let pipeline = Pipeline::new(&load_profile(profile)?)?;
    let mut ids = UuidV4Ids;

    let (summary, _) = if dry_run {
        import_file(file, &pipeline, None, collection, &mut ids, progress)?
    } else {
        let mut store = DuckDbCollections::open(db)?;
        log::info!("Writing to {} (collection {collection:?})", db.display());
        import_file(file, &pipeline, Some(&mut store), collection, &mut ids, progress)?
    };

    log_summary(&summary);
    Ok(summary)
}

/// Prints the stored machines of `collection` in the database at `db`.
///
/// # Errors
///
/// Returns [`IngestError::MissingDatabase`] if there is no file at `db`, or
/// [`IngestError::Db`] if the database or collection cannot be read.
pub fn run_list(db: &Path, collection: &str) -> Result<(), IngestError> {
    if !db.is_file() {
        return Err(IngestError::MissingDatabase {
            path: db.display().to_string(),
        });
    }

    let store = DuckDbCollections::open(db)?;
    let machines = load_machines(&store, collection)?;
    print_machines(&machines);
    if let Some(at) = store.last_replaced_at(collection)? {
        println!("\n{} machine(s), imported {}", machines.len(), at.to_rfc3339());
    }
    Ok(())
}

/// Prints how the built-in rules classify one machine.
pub fn print_classification(model: &str, manufacturer: &str) {
    let classification = Classifier::default().classify(model, manufacturer);
    println!(
        "{} ({})",
        classification.category, classification.category_group
    );
}

/// Prints the built-in classification rules in evaluation order.
pub fn print_rules() {
    println!("{:<4} {:<14} {:<14} CATEGORY", "#", "SCOPE", "PATTERN");
    println!("{}", "-".repeat(50));
    for (i, rule) in Classifier::default().rules().iter().enumerate() {
        let scope = match (rule.scope, rule.kind) {
            (RuleScope::Model, PatternKind::Substring) => "model",
            (RuleScope::Model, PatternKind::TokenPrefix) => "model code",
            (RuleScope::Manufacturer, _) => "manufacturer",
        };
        let pattern = format!("{:?}", rule.pattern);
        println!("{:<4} {scope:<14} {pattern:<14} {}", i + 1, rule.category);
    }
}

#[cfg(test)]
mod tests {
    use fleet_database::DbError;
    use fleet_equipment_models::EquipmentCategory;
    use fleet_ocr::progress::null_progress;

    use super::*;

    const SHEET: &str = "\
==Start of OCR for page 1==
Manufacturer: Genie Manufacturer: Genie
Model: GS-3246 Model: GS 2646
Inventory-No: 4010 01 Inventory-No: 4010  02
==End of OCR for page 1==
==Start of OCR for page 2==
Manufacturer: Manitou
Model: MT 1440
Inventory-No: 7300 11
==End of OCR for page 2==
";

    /// Sequential ids, so tests can predict document keys.
    struct CountingIds(u32);

    impl IdGenerator for CountingIds {
        fn next_id(&mut self) -> String {
            self.0 += 1;
            format!("machine-{:03}", self.0)
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(&ExtractionProfile::default()).unwrap()
    }

    #[test]
    fn import_replaces_collection_in_duckdb() {
        let mut store = DuckDbCollections::open_in_memory().unwrap();

        let (summary, records) = import_text(
            SHEET,
            &pipeline(),
            Some(&mut store),
            "machines",
            &mut CountingIds(0),
            &null_progress(),
        )
        .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.records, 3);
        assert_eq!(summary.written, 3);
        assert_eq!(summary.by_group["Scissor lifts"], 2);
        assert_eq!(summary.by_group["Telehandlers"], 1);
        assert_eq!(records[2].category, EquipmentCategory::Telehandler);

        let stored = load_machines(&store, "machines").unwrap();
        assert_eq!(stored, records);
        assert_eq!(stored[1].inventory_number, "4010 02");
        assert_eq!(stored[0].id, "machine-001");
    }

    #[test]
    fn reimport_supersedes_previous_run() {
        let mut store = DuckDbCollections::open_in_memory().unwrap();
        let pipeline = pipeline();

        for _ in 0..2 {
            import_text(
                SHEET,
                &pipeline,
                Some(&mut store),
                "machines",
                &mut UuidV4Ids,
                &null_progress(),
            )
            .unwrap();
        }

        assert_eq!(load_machines(&store, "machines").unwrap().len(), 3);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (summary, records) = import_text(
            SHEET,
            &pipeline(),
            None,
            "machines",
            &mut UuidV4Ids,
            &null_progress(),
        )
        .unwrap();

        assert_eq!(summary.written, 0);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn unmarked_text_replaces_with_empty_collection() {
        let mut store = DuckDbCollections::open_in_memory().unwrap();
        let (summary, _) = import_text(
            "no page markers at all",
            &pipeline(),
            Some(&mut store),
            "machines",
            &mut UuidV4Ids,
            &null_progress(),
        )
        .unwrap();

        assert_eq!(summary.records, 0);
        assert!(load_machines(&store, "machines").unwrap().is_empty());
    }

    #[test]
    fn invalid_collection_name_fails_the_run() {
        let mut store = DuckDbCollections::open_in_memory().unwrap();
        let result = import_text(
            SHEET,
            &pipeline(),
            Some(&mut store),
            "machines-2024",
            &mut UuidV4Ids,
            &null_progress(),
        );

        assert!(matches!(
            result,
            Err(IngestError::Db(DbError::InvalidCollectionName { .. }))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = import_file(
            Path::new("/nonexistent/fleet/sheet.txt"),
            &pipeline(),
            None,
            "machines",
            &mut UuidV4Ids,
            &null_progress(),
        );
        assert!(matches!(result, Err(IngestError::Read { .. })));
    }

    #[test]
    fn load_profile_defaults_without_path() {
        assert_eq!(load_profile(None).unwrap(), ExtractionProfile::default());
        assert!(matches!(
            load_profile(Some(Path::new("/nonexistent/profile.toml"))),
            Err(IngestError::Ocr(OcrError::Io(_)))
        ));
    }

    #[test]
    fn run_import_writes_database_file() {
        let dir = std::env::temp_dir().join(format!("fleet-ingest-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let sheet = dir.join("sheet.txt");
        let db = dir.join("db").join("fleet.duckdb");
        std::fs::write(&sheet, SHEET).unwrap();

        let dry = run_import(&sheet, None, &db, "machines", true, &null_progress()).unwrap();
        assert_eq!(dry.written, 0);
        assert!(!db.exists());

        let summary = run_import(&sheet, None, &db, "machines", false, &null_progress()).unwrap();
        assert_eq!(summary.written, 3);

        {
            let store = DuckDbCollections::open(&db).unwrap();
            assert_eq!(store.record_count("machines").unwrap(), 3);
        }
        run_list(&db, "machines").unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn listing_a_missing_database_creates_nothing() {
        let dir = std::env::temp_dir().join(format!("fleet-list-test-{}", std::process::id()));
        let db = dir.join("typo.duckdb");

        let err = run_list(&db, "machines").unwrap_err();

        assert!(matches!(err, IngestError::MissingDatabase { .. }));
        assert!(!db.exists());
        assert!(!dir.exists());
    }
}
