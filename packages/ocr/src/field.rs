//! Field label lexicon.
//!
//! Every attribute printed on an inventory sheet is introduced by a label
//! such as `Manufacturer:`. OCR and sheet revisions produce several
//! spellings of the same label, so each [`FieldLabel`] owns an ordered
//! alias list (longest, most specific spelling first).

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A logical attribute of a machine as it appears on the sheet.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldLabel {
    Manufacturer,
    Model,
    SerialNumber,
    InventoryNumber,
    BuildYear,
    Color,
    Dimensions,
    Weight,
    Power,
    Payload,
    Drivetrain,
    WorkingHeight,
    Fuel,
    InspectionDue,
    MaintenanceDue,
    Notes,
}

impl FieldLabel {
    /// Literal label spellings, in match priority order.
    ///
    /// When one alias is contained in another, the longer one must come
    /// first.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Manufacturer => &["Manufacturer:"],
            Self::Model => &["Model:", "Type:"],
            Self::SerialNumber => &["Serial-No.:", "Serial-No:", "Serial No:"],
            Self::InventoryNumber => &["Inventory -No:", "Inventory-No:", "Inventory No:"],
            Self::BuildYear => &["Year of Manufacture:", "Build Year:"],
            Self::Color => &["Colour:", "Color:"],
            Self::Dimensions => &["Dimensions:"],
            Self::Weight => &["Operating Weight:", "Weight:"],
            Self::Power => &["Engine Power:", "Power:"],
            Self::Payload => &["Payload:", "Max. Load:"],
            Self::Drivetrain => &["Drivetrain:", "Drive:"],
            Self::WorkingHeight => &["Working Height:"],
            Self::Fuel => &["Fuel:"],
            Self::InspectionDue => &["Next Inspection:", "Inspection Due:"],
            Self::MaintenanceDue => &["Next Maintenance:", "Maintenance Due:"],
            Self::Notes => &["Special Notes:", "Notes:"],
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Manufacturer,
            Self::Model,
            Self::SerialNumber,
            Self::InventoryNumber,
            Self::BuildYear,
            Self::Color,
            Self::Dimensions,
            Self::Weight,
            Self::Power,
            Self::Payload,
            Self::Drivetrain,
            Self::WorkingHeight,
            Self::Fuel,
            Self::InspectionDue,
            Self::MaintenanceDue,
            Self::Notes,
        ]
    }
}

/// Addresses one extracted value sequence: either a built-in
/// [`FieldLabel`] or a label declared by the extraction profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Field(FieldLabel),
    Extra(String),
}

impl From<FieldLabel> for FieldKey {
    fn from(label: FieldLabel) -> Self {
        Self::Field(label)
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(label) => write!(f, "{label}"),
            Self::Extra(key) => write!(f, "extra:{key}"),
        }
    }
}

/// A label to extract together with the spellings that introduce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub key: FieldKey,
    pub aliases: Vec<String>,
}

impl LabelSpec {
    /// Builds the spec for a built-in label.
    #[must_use]
    pub fn builtin(label: FieldLabel) -> Self {
        Self {
            key: FieldKey::Field(label),
            aliases: label.aliases().iter().map(|&a| a.to_owned()).collect(),
        }
    }

    /// Builds the spec for a profile-declared label.
    ///
    /// Aliases are reordered longest first so that a short spelling can
    /// never win over a longer one that contains it.
    #[must_use]
    pub fn extra(key: &str, aliases: &[String]) -> Self {
        let mut aliases: Vec<String> = aliases
            .iter()
            .filter(|a| !a.trim().is_empty())
            .cloned()
            .collect();
        aliases.sort_by(|a, b| b.len().cmp(&a.len()));
        Self {
            key: FieldKey::Extra(key.to_owned()),
            aliases,
        }
    }
}

/// Returns the built-in lexicon, one [`LabelSpec`] per [`FieldLabel`].
#[must_use]
pub fn builtin_lexicon() -> Vec<LabelSpec> {
    FieldLabel::all()
        .iter()
        .copied()
        .map(LabelSpec::builtin)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn longer_aliases_come_first() {
        for label in FieldLabel::all() {
            let aliases = label.aliases();
            for (i, earlier) in aliases.iter().enumerate() {
                for later in &aliases[i + 1..] {
                    assert!(
                        !later.contains(earlier),
                        "{label}: alias {earlier:?} is shadowed by later {later:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn aliases_do_not_collide_across_labels() {
        for a in FieldLabel::all() {
            for b in FieldLabel::all() {
                if a == b {
                    continue;
                }
                for alias_a in a.aliases() {
                    for alias_b in b.aliases() {
                        assert!(
                            !alias_b.contains(alias_a),
                            "{a} alias {alias_a:?} occurs inside {b} alias {alias_b:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn labels_parse_from_snake_case() {
        assert_eq!(
            FieldLabel::from_str("inventory_number").unwrap(),
            FieldLabel::InventoryNumber
        );
        assert!(FieldLabel::from_str("not_a_field").is_err());
    }

    #[test]
    fn extra_spec_sorts_longest_first_and_skips_blanks() {
        let spec = LabelSpec::extra(
            "cost_center",
            &["CC:".to_owned(), "  ".to_owned(), "Cost Center CC:".to_owned()],
        );
        assert_eq!(spec.key, FieldKey::Extra("cost_center".to_owned()));
        assert_eq!(spec.aliases, vec!["Cost Center CC:", "CC:"]);
    }
}
