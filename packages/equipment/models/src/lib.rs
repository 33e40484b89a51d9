#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Equipment category taxonomy and the canonical machine record.
//!
//! Every machine recovered from an inventory sheet is classified into one
//! of the closed set of [`EquipmentCategory`] variants and stored as a
//! [`MachineRecord`]. The category set always contains a catch-all
//! ([`EquipmentCategory::Other`]) so classification can never fail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Equipment categories a machine can be filed under.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentCategory {
    /// Self-propelled scissor platforms
    ScissorLift,
    /// Articulating and telescopic boom platforms
    BoomLift,
    /// Telescopic handlers
    Telehandler,
    /// Mini, compact and crawler excavators
    Excavator,
    /// Wheel and skid-steer loaders
    WheelLoader,
    /// Site dumpers
    Dumper,
    /// Rollers, rammers and vibratory plates
    Compactor,
    /// Mobile power generators
    Generator,
    /// Industrial forklifts
    Forklift,
    /// Anything that no rule recognized
    #[default]
    Other,
}

impl EquipmentCategory {
    /// Returns the human-readable group label paired with this category.
    #[must_use]
    pub const fn group(self) -> &'static str {
        match self {
            Self::ScissorLift => "Scissor lifts",
            Self::BoomLift => "Boom lifts",
            Self::Telehandler => "Telehandlers",
            Self::Excavator => "Excavators",
            Self::WheelLoader => "Wheel loaders",
            Self::Dumper => "Dumpers",
            Self::Compactor => "Compaction equipment",
            Self::Generator => "Generators",
            Self::Forklift => "Forklifts",
            Self::Other => "Other equipment",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ScissorLift,
            Self::BoomLift,
            Self::Telehandler,
            Self::Excavator,
            Self::WheelLoader,
            Self::Dumper,
            Self::Compactor,
            Self::Generator,
            Self::Forklift,
            Self::Other,
        ]
    }
}

/// Operational lifecycle of a machine.
///
/// Extraction only ever produces [`MachineStatus::Available`]; the other
/// states are set later by whoever manages the fleet.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    /// Ready to be handed out
    #[default]
    Available,
    /// Currently out on a job or rental
    Rented,
    /// In the workshop for scheduled maintenance
    InMaintenance,
    /// Broken and waiting for repair
    Defective,
    /// Taken out of the fleet
    Retired,
}

/// A single machine recovered from one column of an inventory sheet.
///
/// Attribute values are kept as the opaque strings the sheet printed. Units
/// and date formats vary between sheets, so nothing beyond whitespace
/// cleanup is parsed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineRecord {
    /// Generated identifier, unrelated to any source field.
    pub id: String,
    /// Whitespace-normalized inventory number (natural external key).
    pub inventory_number: String,
    /// `manufacturer model`, with empty parts left out.
    pub display_name: String,
    /// Classified equipment category.
    pub category: EquipmentCategory,
    /// Group label paired with [`Self::category`].
    pub category_group: String,
    /// Manufacturer as printed on the sheet (possibly empty).
    pub manufacturer: String,
    /// Model or type designation as printed (possibly empty).
    pub model: String,
    /// Lifecycle status, [`MachineStatus::Available`] on creation.
    pub status: MachineStatus,
    pub serial_number: Option<String>,
    pub color: Option<String>,
    pub dimensions: Option<String>,
    pub weight: Option<String>,
    pub power: Option<String>,
    pub payload: Option<String>,
    pub drivetrain: Option<String>,
    pub build_year: Option<String>,
    pub working_height: Option<String>,
    pub fuel: Option<String>,
    /// Next statutory inspection, as printed.
    pub inspection_due: Option<String>,
    /// Next scheduled maintenance, as printed.
    pub maintenance_due: Option<String>,
    pub notes: Option<String>,
    /// 1-based page (in order of appearance) the column was read from.
    pub source_page: u32,
    /// Attributes read through profile-declared extra labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}
