//! Mapping between [`MachineRecord`] and stored documents.

use fleet_equipment_models::MachineRecord;

use crate::DbError;
use crate::sink::{CollectionSchema, Document};

/// Default collection name for machine records.
pub const MACHINES_COLLECTION: &str = "machines";

/// Projected columns of a machine collection. Every scalar record field
/// except `id`, which is the document key.
#[must_use]
pub fn machine_schema() -> CollectionSchema {
    CollectionSchema::new(&[
        "inventoryNumber",
        "displayName",
        "category",
        "categoryGroup",
        "manufacturer",
        "model",
        "status",
        "serialNumber",
        "color",
        "dimensions",
        "weight",
        "power",
        "payload",
        "drivetrain",
        "buildYear",
        "workingHeight",
        "fuel",
        "inspectionDue",
        "maintenanceDue",
        "notes",
        "sourcePage",
    ])
}

/// Serializes a record into a document keyed by its id.
///
/// # Errors
///
/// Returns [`DbError::Json`] if serialization fails.
pub fn machine_document(record: &MachineRecord) -> Result<Document, DbError> {
    Ok(Document {
        id: record.id.clone(),
        payload: serde_json::to_value(record)?,
    })
}

/// Reads a record back out of a stored document.
///
/// # Errors
///
/// Returns [`DbError::Json`] if the payload is not a machine record.
pub fn machine_from_document(document: &Document) -> Result<MachineRecord, DbError> {
    Ok(serde_json::from_value(document.payload.clone())?)
}

#[cfg(test)]
mod tests {
    use fleet_equipment_models::{EquipmentCategory, MachineStatus};

    use super::*;

    fn record() -> MachineRecord {
        MachineRecord {
            id: "7d0c7f2e-0000-4000-8000-000000000001".to_owned(),
            inventory_number: "4010 01".to_owned(),
            display_name: "Genie GS-3246".to_owned(),
            category: EquipmentCategory::ScissorLift,
            category_group: EquipmentCategory::ScissorLift.group().to_owned(),
            manufacturer: "Genie".to_owned(),
            model: "GS-3246".to_owned(),
            status: MachineStatus::Available,
            payload: Some("318 kg".to_owned()),
            source_page: 2,
            ..MachineRecord::default()
        }
    }

    #[test]
    fn schema_covers_every_serialized_scalar_field() {
        let value = serde_json::to_value(MachineRecord::default()).unwrap();
        let schema = machine_schema();

        for key in value.as_object().unwrap().keys() {
            if key == "id" || key == "extra" {
                continue;
            }
            assert!(schema.fields.contains(key), "{key} missing from schema");
        }
        assert!(!schema.fields.iter().any(|field| field == "id"));
    }

    #[test]
    fn document_is_keyed_by_record_id() {
        let document = machine_document(&record()).unwrap();

        assert_eq!(document.id, "7d0c7f2e-0000-4000-8000-000000000001");
        assert_eq!(document.payload["inventoryNumber"], "4010 01");
        assert_eq!(document.payload["category"], "SCISSOR_LIFT");
        assert_eq!(document.payload["payload"], "318 kg");
        assert_eq!(machine_from_document(&document).unwrap(), record());
    }

    #[test]
    fn foreign_payload_is_rejected() {
        let document = Document {
            id: "x".to_owned(),
            payload: serde_json::json!({ "model": 5 }),
        };
        assert!(matches!(
            machine_from_document(&document),
            Err(DbError::Json(_))
        ));
    }
}
