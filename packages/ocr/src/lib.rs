#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Machine record extraction from multi-column OCR text.
//!
//! Inventory sheets list several machines side by side, one column per
//! machine. OCR flattens each page into lines that repeat a label before
//! every column's value. This crate reverses that:
//!
//! 1. [`page`] splits the OCR stream into pages,
//! 2. [`extract`] collects each label's values left to right,
//! 3. [`align`] zips those value sequences back into columns,
//! 4. [`classify`] files each machine under an equipment category,
//! 5. [`assemble`] builds the final [`MachineRecord`].
//!
//! [`Pipeline`] runs all five stages for a whole document. Every stage is
//! total over malformed input: missing markers, labels or values produce
//! fewer records, never an error.

pub mod align;
pub mod assemble;
pub mod classify;
pub mod extract;
pub mod field;
pub mod page;
pub mod profile;
pub mod progress;

use std::sync::Arc;

pub use fleet_equipment_models::MachineRecord;

use crate::align::align_columns;
use crate::assemble::{IdGenerator, UuidV4Ids, assemble_record};
use crate::classify::Classifier;
use crate::extract::FieldExtractor;
use crate::field::{FieldKey, FieldLabel};
use crate::page::{PageSplitter, RawPage};
use crate::profile::ExtractionProfile;
use crate::progress::{ProgressCallback, null_progress};

/// Errors raised while setting up an extraction.
///
/// Running an extraction never fails; only a bad profile does.
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// A page marker template is unusable.
    #[error("Invalid page marker: {0}")]
    MarkerTemplate(String),

    /// A label or marker pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// The extraction profile could not be parsed.
    #[error("Invalid extraction profile: {0}")]
    Profile(#[from] toml::de::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Records produced by one run, with counters for reporting.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<MachineRecord>,
    /// Pages found in the source text.
    pub pages: usize,
    /// Pages that had no key field values (cover sheets, legends, ...).
    pub pages_without_data: usize,
    /// Columns whose required fields were all empty.
    pub incomplete_columns: usize,
    /// Incomplete columns that were dropped (`drop_incomplete`).
    pub dropped_columns: usize,
}

/// A compiled extraction profile plus the classifier to apply.
#[derive(Debug, Clone)]
pub struct Pipeline {
    splitter: PageSplitter,
    extractor: FieldExtractor,
    classifier: Classifier,
    key_field: FieldKey,
    required_fields: Vec<FieldLabel>,
    drop_incomplete: bool,
}

impl Pipeline {
    /// Compiles `profile` with the built-in classifier rules.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError`] if a page marker or label pattern is invalid.
    pub fn new(profile: &ExtractionProfile) -> Result<Self, OcrError> {
        Ok(Self {
            splitter: PageSplitter::new(&profile.page_start_marker, &profile.page_end_marker)?,
            extractor: FieldExtractor::new(&profile.lexicon())?,
            classifier: Classifier::default(),
            key_field: FieldKey::Field(profile.key_field),
            required_fields: profile.required_fields.clone(),
            drop_incomplete: profile.drop_incomplete,
        })
    }

    /// Replaces the classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// The classifier this pipeline applies.
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Extracts every machine record from `text`.
    ///
    /// Pages are independent; their records are concatenated in page order.
    pub fn run(
        &self,
        text: &str,
        ids: &mut dyn IdGenerator,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Extraction {
        let pages = self.splitter.split(text);
        let mut extraction = Extraction {
            pages: pages.len(),
            ..Extraction::default()
        };

        progress.set_total(pages.len() as u64);

        for page in &pages {
            progress.set_message(format!("Page {}", page.index));
            let before = extraction.records.len();
            self.process_page(page, ids, &mut extraction);
            log::debug!(
                "Page {} (printed {:?}): {} record(s)",
                page.index,
                page.printed_number,
                extraction.records.len() - before
            );
            progress.inc(1);
        }

        log::info!(
            "Extracted {} record(s) from {} page(s) ({} without data, {} incomplete column(s), {} dropped)",
            extraction.records.len(),
            extraction.pages,
            extraction.pages_without_data,
            extraction.incomplete_columns,
            extraction.dropped_columns,
        );
        progress.finish(format!(
            "Extracted {} record(s) from {} page(s)",
            extraction.records.len(),
            extraction.pages
        ));

        extraction
    }

    fn process_page(&self, page: &RawPage, ids: &mut dyn IdGenerator, out: &mut Extraction) {
        let sequences = self.extractor.extract_all(&page.text);
        let columns = align_columns(&sequences, &self.key_field, page.index);

        if columns.is_empty() {
            out.pages_without_data += 1;
            return;
        }

        for (i, column) in columns.iter().enumerate() {
            if column.missing_required(&self.required_fields) {
                out.incomplete_columns += 1;
                log::debug!(
                    "Page {}: column {} has none of the required fields",
                    page.index,
                    i + 1
                );
                if self.drop_incomplete {
                    out.dropped_columns += 1;
                    continue;
                }
            }

            let classification = self.classifier.classify(
                column.get(FieldLabel::Model),
                column.get(FieldLabel::Manufacturer),
            );
            out.records
                .push(assemble_record(column, classification, page.index, ids));
        }
    }
}

/// Extracts machine records from `text` using `profile`, random UUIDs and
/// no progress reporting.
///
/// # Errors
///
/// Returns [`OcrError`] if the profile is invalid.
pub fn extract_machine_records(
    text: &str,
    profile: &ExtractionProfile,
) -> Result<Vec<MachineRecord>, OcrError> {
    let pipeline = Pipeline::new(profile)?;
    Ok(pipeline.run(text, &mut UuidV4Ids, &null_progress()).records)
}
