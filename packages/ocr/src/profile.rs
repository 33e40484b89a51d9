//! Extraction profiles.
//!
//! A profile describes how a family of inventory sheets is laid out: the
//! page markers the OCR engine wrote, which label fixes the column count,
//! which labels a column needs to be worth keeping, and any labels beyond
//! the built-in lexicon. Profiles are TOML; every key is optional.
//!
//! ```toml
//! page_start_marker = "==Start of OCR for page {page}=="
//! page_end_marker = "==End of OCR for page {page}=="
//! key_field = "inventory_number"
//! required_fields = ["manufacturer", "model"]
//! drop_incomplete = false
//!
//! [[extra_labels]]
//! key = "cost_center"
//! aliases = ["Cost Center:"]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::OcrError;
use crate::field::{FieldKey, FieldLabel, LabelSpec, builtin_lexicon};

/// Default page start marker.
pub const DEFAULT_START_MARKER: &str = "==Start of OCR for page {page}==";

/// Default page end marker.
pub const DEFAULT_END_MARKER: &str = "==End of OCR for page {page}==";

/// Layout description of one family of inventory sheets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionProfile {
    /// Page start marker, containing `{page}`.
    pub page_start_marker: String,
    /// Page end marker, containing `{page}`.
    pub page_end_marker: String,
    /// Label whose value count decides how many columns a page has.
    pub key_field: FieldLabel,
    /// A column is flagged as incomplete when all of these are empty.
    pub required_fields: Vec<FieldLabel>,
    /// Drop flagged columns instead of assembling them.
    pub drop_incomplete: bool,
    /// Labels outside the built-in lexicon, kept in the record's side map.
    pub extra_labels: Vec<ExtraLabel>,
}

/// A profile-declared label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraLabel {
    /// Key under which values land in `MachineRecord::extra`.
    pub key: String,
    /// Literal spellings of the label.
    pub aliases: Vec<String>,
}

impl Default for ExtractionProfile {
    fn default() -> Self {
        Self {
            page_start_marker: DEFAULT_START_MARKER.to_owned(),
            page_end_marker: DEFAULT_END_MARKER.to_owned(),
            key_field: FieldLabel::InventoryNumber,
            required_fields: vec![FieldLabel::Manufacturer, FieldLabel::Model],
            drop_incomplete: false,
            extra_labels: Vec::new(),
        }
    }
}

impl ExtractionProfile {
    /// Parses a profile from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError::Profile`] if the TOML is malformed or names an
    /// unknown field label.
    pub fn from_toml_str(text: &str) -> Result<Self, OcrError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a profile file.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError::Io`] if the file cannot be read, or
    /// [`OcrError::Profile`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, OcrError> {
        let text = std::fs::read_to_string(path)?;
        let profile = Self::from_toml_str(&text)?;
        log::debug!("Loaded extraction profile from {}", path.display());
        Ok(profile)
    }

    /// The full label lexicon: built-in labels followed by extra labels.
    ///
    /// An alias already spelled by another label is dropped with a
    /// warning, so every alias has exactly one owner. Extra labels
    /// declared more than once under the same key are merged.
    #[must_use]
    pub fn lexicon(&self) -> Vec<LabelSpec> {
        let mut lexicon = builtin_lexicon();
        let builtin_count = lexicon.len();

        for extra in &self.extra_labels {
            let key = FieldKey::Extra(extra.key.clone());
            let mut aliases: Vec<String> = Vec::new();

            for alias in &extra.aliases {
                let owner = lexicon
                    .iter()
                    .find(|spec| spec.key != key && spec.aliases.contains(alias));
                if let Some(owner) = owner {
                    log::warn!(
                        "Extra label {:?}: alias {alias:?} already belongs to {}, ignoring it",
                        extra.key,
                        owner.key
                    );
                } else if !aliases.contains(alias) {
                    aliases.push(alias.clone());
                }
            }

            if let Some(existing) = lexicon[builtin_count..]
                .iter_mut()
                .find(|spec| spec.key == key)
            {
                log::warn!(
                    "Extra label {:?} is declared more than once, merging its aliases",
                    extra.key
                );
                let mut merged = existing.aliases.clone();
                merged.extend(aliases.into_iter().filter(|a| !existing.aliases.contains(a)));
                *existing = LabelSpec::extra(&extra.key, &merged);
            } else {
                lexicon.push(LabelSpec::extra(&extra.key, &aliases));
            }
        }

        lexicon
    }
}
