//! Field column extraction.
//!
//! OCR reads a multi-column sheet line by line, so a single line holds the
//! value of one attribute for every machine on the page, each preceded by
//! its label:
//!
//! ```text
//! Manufacturer: Genie Manufacturer: JLG Manufacturer: Haulotte
//! ```
//!
//! For one label this module collects those values, left to right, into a
//! value sequence.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;

use crate::OcrError;
use crate::field::{FieldKey, LabelSpec};

/// Compiled matcher for a label lexicon.
///
/// A page is scanned once with a single alternation of every alias,
/// longest first, so wherever one alias is part of another only the longer
/// spelling matches. Each match is credited to the label owning that
/// spelling.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    keys: Vec<FieldKey>,
    /// Alias text to index into `keys`. The first label declaring an alias
    /// owns it.
    owners: HashMap<String, usize>,
    boundary: Option<Regex>,
}

impl FieldExtractor {
    /// Compiles the matcher for every label in `lexicon`.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError::Regex`] if the matcher fails to compile.
    pub fn new(lexicon: &[LabelSpec]) -> Result<Self, OcrError> {
        let mut owners = HashMap::new();
        for (index, spec) in lexicon.iter().enumerate() {
            for alias in spec.aliases.iter().filter(|a| !a.is_empty()) {
                owners.entry(alias.clone()).or_insert(index);
            }
        }

        let mut all_aliases: Vec<&String> = owners.keys().collect();
        all_aliases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let boundary = alternation(all_aliases.into_iter())?;

        Ok(Self {
            keys: lexicon.iter().map(|spec| spec.key.clone()).collect(),
            owners,
            boundary,
        })
    }

    /// Keys of all labels this extractor knows, in lexicon order.
    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.keys.iter()
    }

    /// Extracts the value sequence for `key` from one page.
    ///
    /// Each occurrence of the label contributes one value: the text after
    /// the label up to the end of the line or the next known label,
    /// whichever comes first, trimmed. Empty values are kept. An unknown key
    /// or a label that never occurs gives an empty sequence.
    #[must_use]
    pub fn extract(&self, page_text: &str, key: &FieldKey) -> Vec<String> {
        self.occurrences(page_text)
            .into_iter()
            .filter(|(owner, _)| *owner == key)
            .map(|(_, value)| value.to_owned())
            .collect()
    }

    /// Extracts the value sequences of every known label from one page.
    ///
    /// Labels that never occur are present with an empty sequence.
    #[must_use]
    pub fn extract_all(&self, page_text: &str) -> BTreeMap<FieldKey, Vec<String>> {
        let mut all: BTreeMap<FieldKey, Vec<String>> =
            self.keys().map(|key| (key.clone(), Vec::new())).collect();

        for (owner, value) in self.occurrences(page_text) {
            if let Some(values) = all.get_mut(owner) {
                values.push(value.to_owned());
            }
        }

        all
    }

    /// Every label occurrence on the page with the value it introduces,
    /// in reading order.
    fn occurrences<'a>(&'a self, text: &'a str) -> Vec<(&'a FieldKey, &'a str)> {
        let Some(boundary) = &self.boundary else {
            return Vec::new();
        };
        let matches: Vec<_> = boundary.find_iter(text).collect();

        matches
            .iter()
            .enumerate()
            .filter_map(|(i, m)| {
                let owner = &self.keys[*self.owners.get(m.as_str())?];
                let start = m.end();
                let line_end = text[start..].find('\n').map_or(text.len(), |n| start + n);
                let end = matches
                    .get(i + 1)
                    .map_or(line_end, |next| next.start().min(line_end));
                Some((owner, text[start..end].trim()))
            })
            .collect()
    }
}

fn alternation<'a>(aliases: impl Iterator<Item = &'a String>) -> Result<Option<Regex>, OcrError> {
    let pattern = aliases
        .map(|a| regex::escape(a))
        .collect::<Vec<_>>()
        .join("|");

    if pattern.is_empty() {
        return Ok(None);
    }

    Ok(Some(Regex::new(&pattern)?))
}
