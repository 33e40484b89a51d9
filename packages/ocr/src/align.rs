//! Column alignment.
//!
//! Recombines per-label value sequences into one set of values per
//! physical column by position. The key field (the inventory number by
//! default) fixes the column count because it is the most reliably
//! delimited label on a sheet. Other labels are zipped against it:
//!
//! - a shorter sequence leaves its trailing columns empty,
//! - a longer sequence is truncated.
//!
//! This is a best-effort policy. A value lost from the *middle* of one
//! label's sequence shifts that label by one column for the rest of the
//! page, and nothing here can detect it.

use std::collections::BTreeMap;

use crate::field::{FieldKey, FieldLabel};

/// The values of every label for one physical column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnValues {
    values: BTreeMap<FieldKey, String>,
}

impl ColumnValues {
    /// Value of a built-in label, or `""` when the label was not extracted.
    #[must_use]
    pub fn get(&self, label: FieldLabel) -> &str {
        self.get_key(&FieldKey::Field(label))
    }

    /// Value of any label, or `""` when the label was not extracted.
    #[must_use]
    pub fn get_key(&self, key: &FieldKey) -> &str {
        self.values.get(key).map_or("", String::as_str)
    }

    /// Values of profile-declared labels, keyed by their profile key.
    pub fn extras(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().filter_map(|(key, value)| match key {
            FieldKey::Extra(name) => Some((name.as_str(), value.as_str())),
            FieldKey::Field(_) => None,
        })
    }

    /// Returns `true` when every field in `required` is empty.
    ///
    /// An empty `required` set never flags a column.
    #[must_use]
    pub fn missing_required(&self, required: &[FieldLabel]) -> bool {
        !required.is_empty() && required.iter().all(|&label| self.get(label).is_empty())
    }

    /// Sets a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<FieldKey>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

/// Zips the value sequences of one page into columns.
///
/// Returns exactly as many columns as `key_field` has values; an absent or
/// empty key sequence yields no columns. `page` is only used for logging.
#[must_use]
pub fn align_columns(
    sequences: &BTreeMap<FieldKey, Vec<String>>,
    key_field: &FieldKey,
    page: u32,
) -> Vec<ColumnValues> {
    let column_count = sequences.get(key_field).map_or(0, Vec::len);

    if column_count == 0 {
        log::debug!("Page {page}: no {key_field} values, treating as a non-data page");
        return Vec::new();
    }

    for (key, values) in sequences {
        let len = values.len();
        if len == 0 || len == column_count {
            continue;
        }
        if len < column_count {
            log::warn!(
                "Page {page}: {key} has {len} value(s) for {column_count} column(s), \
                 leaving the last {} empty",
                column_count - len
            );
        } else {
            log::warn!(
                "Page {page}: {key} has {len} value(s) for {column_count} column(s), \
                 ignoring the extra {}",
                len - column_count
            );
        }
    }

    (0..column_count)
        .map(|i| {
            let mut column = ColumnValues::default();
            for (key, values) in sequences {
                let value = values.get(i).map_or("", String::as_str);
                column.insert(key.clone(), value);
            }
            column
        })
        .collect()
}
