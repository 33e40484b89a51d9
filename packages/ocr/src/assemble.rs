//! Machine record assembly.
//!
//! Turns one aligned column plus its classification into a
//! [`MachineRecord`]. Assembly is total: a column with neither manufacturer
//! nor model still becomes a record, and dropping such columns is left to
//! the caller.

use std::collections::BTreeMap;

use fleet_equipment_models::{MachineRecord, MachineStatus};

use crate::align::ColumnValues;
use crate::classify::Classification;
use crate::field::FieldLabel;

/// Source of record identifiers for one run.
pub trait IdGenerator {
    /// Returns a fresh identifier, distinct from every other one issued.
    fn next_id(&mut self) -> String;
}

/// Random version 4 UUIDs (122 random bits).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV4Ids;

impl IdGenerator for UuidV4Ids {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Collapses every run of whitespace to a single space and trims the ends.
///
/// OCR frequently breaks alphanumeric codes with irregular spacing. The
/// result is stable: normalizing twice gives the same string.
#[must_use]
pub fn normalize_inventory_number(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins manufacturer and model with one space, leaving out empty parts.
///
/// The composition is lossy: a display name cannot be reliably split back
/// into manufacturer and model, because either part may itself contain
/// spaces.
#[must_use]
pub fn compose_display_name(manufacturer: &str, model: &str) -> String {
    [manufacturer.trim(), model.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the record for one column.
#[must_use]
pub fn assemble_record(
    column: &ColumnValues,
    classification: Classification,
    source_page: u32,
    ids: &mut dyn IdGenerator,
) -> MachineRecord {
    let manufacturer = column.get(FieldLabel::Manufacturer).to_owned();
    let model = column.get(FieldLabel::Model).to_owned();
    let optional = |label| non_empty(column.get(label));

    MachineRecord {
        id: ids.next_id(),
        inventory_number: normalize_inventory_number(column.get(FieldLabel::InventoryNumber)),
        display_name: compose_display_name(&manufacturer, &model),
        category: classification.category,
        category_group: classification.category_group.to_owned(),
        status: MachineStatus::Available,
        serial_number: optional(FieldLabel::SerialNumber),
        color: optional(FieldLabel::Color),
        dimensions: optional(FieldLabel::Dimensions),
        weight: optional(FieldLabel::Weight),
        power: optional(FieldLabel::Power),
        payload: optional(FieldLabel::Payload),
        drivetrain: optional(FieldLabel::Drivetrain),
        build_year: optional(FieldLabel::BuildYear),
        working_height: optional(FieldLabel::WorkingHeight),
        fuel: optional(FieldLabel::Fuel),
        inspection_due: optional(FieldLabel::InspectionDue),
        maintenance_due: optional(FieldLabel::MaintenanceDue),
        notes: optional(FieldLabel::Notes),
        source_page,
        extra: column
            .extras()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect::<BTreeMap<_, _>>(),
        manufacturer,
        model,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use fleet_equipment_models::EquipmentCategory;

    use super::*;
    use crate::field::FieldKey;

    #[test]
    fn normalizes_inventory_whitespace() {
        assert_eq!(normalize_inventory_number("  4010   01 "), "4010 01");
        assert_eq!(normalize_inventory_number("4010\t01\n"), "4010 01");
        assert_eq!(normalize_inventory_number(""), "");
        assert_eq!(normalize_inventory_number("   "), "");
    }

    #[test]
    fn inventory_normalization_is_idempotent() {
        for raw in [
            "4010 01",
            "  A  B\tC \n D ",
            "",
            " \u{a0}X\u{2003}Y ",
            "no-spaces",
            "\t\t",
        ] {
            let once = normalize_inventory_number(raw);
            assert_eq!(normalize_inventory_number(&once), once, "{raw:?}");
        }
    }

    #[test]
    fn display_name_omits_empty_parts() {
        assert_eq!(compose_display_name("Genie", "GS-3246"), "Genie GS-3246");
        assert_eq!(compose_display_name("Genie", ""), "Genie");
        assert_eq!(compose_display_name("", "GS-3246"), "GS-3246");
        assert_eq!(compose_display_name(" ", ""), "");
    }

    #[test]
    fn display_name_is_not_reversible() {
        // Documented non-property: both inputs produce the same name, so no
        // splitter can recover the originals.
        assert_eq!(
            compose_display_name("Wacker Neuson", "EZ17"),
            compose_display_name("Wacker", "Neuson EZ17")
        );
    }

    #[test]
    fn assembles_record_from_column() {
        let mut column = ColumnValues::default();
        column.insert(FieldLabel::InventoryNumber, "4010  01");
        column.insert(FieldLabel::Manufacturer, "Genie");
        column.insert(FieldLabel::Model, "GS-3246");
        column.insert(FieldLabel::Weight, "2.2 t");
        column.insert(FieldLabel::Color, "");
        column.insert(FieldKey::Extra("cost_center".to_owned()), "310");

        let record = assemble_record(
            &column,
            EquipmentCategory::ScissorLift.into(),
            3,
            &mut UuidV4Ids,
        );

        assert_eq!(record.inventory_number, "4010 01");
        assert_eq!(record.display_name, "Genie GS-3246");
        assert_eq!(record.category, EquipmentCategory::ScissorLift);
        assert_eq!(record.category_group, "Scissor lifts");
        assert_eq!(record.status, MachineStatus::Available);
        assert_eq!(record.weight.as_deref(), Some("2.2 t"));
        assert_eq!(record.color, None);
        assert_eq!(record.source_page, 3);
        assert_eq!(record.extra.get("cost_center").map(String::as_str), Some("310"));
        assert!(uuid::Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn blank_column_is_still_assembled() {
        let record = assemble_record(
            &ColumnValues::default(),
            EquipmentCategory::Other.into(),
            1,
            &mut UuidV4Ids,
        );

        assert_eq!(record.manufacturer, "");
        assert_eq!(record.model, "");
        assert_eq!(record.display_name, "");
        assert_eq!(record.status, MachineStatus::Available);
        assert_eq!(record.category, EquipmentCategory::Other);
    }

    #[test]
    fn ten_thousand_ids_are_distinct() {
        let column = ColumnValues::default();
        let mut ids = UuidV4Ids;
        let seen: BTreeSet<String> = (0..10_000)
            .map(|_| assemble_record(&column, EquipmentCategory::Other.into(), 1, &mut ids).id)
            .collect();

        assert_eq!(seen.len(), 10_000);
    }
}
