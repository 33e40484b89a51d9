//! The collection sink contract.
//!
//! A sink stores flat JSON documents in named collections. The ingest run
//! only needs [`replace_collection`]; the single-document operations serve
//! the application that works with the stored records afterwards.

use serde::{Deserialize, Serialize};

use crate::DbError;

/// One stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Flat JSON object.
    pub payload: serde_json::Value,
}

/// Field names a collection projects out of its documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSchema {
    pub fields: Vec<String>,
}

impl CollectionSchema {
    #[must_use]
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|&field| field.to_owned()).collect(),
        }
    }
}

/// Storage backend for document collections.
pub trait CollectionSink {
    /// Removes a collection and its documents. Deleting a collection that
    /// does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    fn delete_collection(&mut self, name: &str) -> Result<(), DbError>;

    /// Creates an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the name is invalid or the backend fails.
    fn create_collection(&mut self, name: &str, schema: &CollectionSchema) -> Result<(), DbError>;

    /// Inserts documents, returning how many rows were written. A repeated
    /// id overwrites the earlier document.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingCollection`] if the collection does not
    /// exist, or another [`DbError`] if the backend fails.
    fn bulk_insert(&mut self, name: &str, documents: &[Document]) -> Result<u64, DbError>;

    /// Fetches one document by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the collection is missing or the backend fails.
    fn get(&self, name: &str, id: &str) -> Result<Option<Document>, DbError>;

    /// Returns every document in the collection, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the collection is missing or the backend fails.
    fn list(&self, name: &str) -> Result<Vec<Document>, DbError>;

    /// Inserts or replaces one document.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the collection is missing or the backend fails.
    fn upsert(&mut self, name: &str, document: &Document) -> Result<(), DbError>;

    /// Deletes one document, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the collection is missing or the backend fails.
    fn delete(&mut self, name: &str, id: &str) -> Result<bool, DbError>;
}

/// Replaces a collection's contents: delete, create, then one bulk insert.
///
/// There is no rollback. If a step fails the collection may be missing or
/// empty, and rerunning the import restores it.
///
/// # Errors
///
/// Returns the first [`DbError`] raised by the sink.
pub fn replace_collection(
    sink: &mut dyn CollectionSink,
    name: &str,
    schema: &CollectionSchema,
    documents: &[Document],
) -> Result<u64, DbError> {
    sink.delete_collection(name)?;
    sink.create_collection(name, schema)?;
    let written = sink.bulk_insert(name, documents)?;

    log::info!("Replaced collection {name:?} with {written} document(s)");

    Ok(written)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use super::*;

    /// In-memory sink that records every call.
    #[derive(Default)]
    pub struct RecordingSink {
        pub calls: Vec<String>,
        pub collections: BTreeMap<String, BTreeMap<String, Document>>,
        pub fail_on: Option<&'static str>,
    }

    impl RecordingSink {
        fn record(&mut self, call: &'static str, name: &str) -> Result<(), DbError> {
            self.calls.push(format!("{call}:{name}"));
            if self.fail_on == Some(call) {
                return Err(DbError::MissingCollection {
                    name: name.to_owned(),
                });
            }
            Ok(())
        }

        fn collection(&self, name: &str) -> Result<&BTreeMap<String, Document>, DbError> {
            self.collections
                .get(name)
                .ok_or_else(|| DbError::MissingCollection {
                    name: name.to_owned(),
                })
        }

        fn collection_mut(
            &mut self,
            name: &str,
        ) -> Result<&mut BTreeMap<String, Document>, DbError> {
            self.collections
                .get_mut(name)
                .ok_or_else(|| DbError::MissingCollection {
                    name: name.to_owned(),
                })
        }
    }

    impl CollectionSink for RecordingSink {
        fn delete_collection(&mut self, name: &str) -> Result<(), DbError> {
            self.record("delete_collection", name)?;
            self.collections.remove(name);
            Ok(())
        }

        fn create_collection(
            &mut self,
            name: &str,
            _schema: &CollectionSchema,
        ) -> Result<(), DbError> {
            self.record("create_collection", name)?;
            self.collections.insert(name.to_owned(), BTreeMap::new());
            Ok(())
        }

        fn bulk_insert(&mut self, name: &str, documents: &[Document]) -> Result<u64, DbError> {
            self.record("bulk_insert", name)?;
            let collection = self.collection_mut(name)?;
            for document in documents {
                collection.insert(document.id.clone(), document.clone());
            }
            Ok(documents.len() as u64)
        }

        fn get(&self, name: &str, id: &str) -> Result<Option<Document>, DbError> {
            Ok(self.collection(name)?.get(id).cloned())
        }

        fn list(&self, name: &str) -> Result<Vec<Document>, DbError> {
            Ok(self.collection(name)?.values().cloned().collect())
        }

        fn upsert(&mut self, name: &str, document: &Document) -> Result<(), DbError> {
            self.collection_mut(name)?
                .insert(document.id.clone(), document.clone());
            Ok(())
        }

        fn delete(&mut self, name: &str, id: &str) -> Result<bool, DbError> {
            Ok(self.collection_mut(name)?.remove(id).is_some())
        }
    }

    pub fn doc(id: &str, payload: serde_json::Value) -> Document {
        Document {
            id: id.to_owned(),
            payload,
        }
    }

    #[test]
    fn replace_calls_delete_create_insert_once_in_order() {
        let mut sink = RecordingSink::default();
        let docs = [
            doc("a", serde_json::json!({ "model": "GS-3246" })),
            doc("b", serde_json::json!({ "model": "Z-45" })),
        ];

        let written =
            replace_collection(&mut sink, "machines", &CollectionSchema::default(), &docs)
                .unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            sink.calls,
            vec![
                "delete_collection:machines",
                "create_collection:machines",
                "bulk_insert:machines",
            ]
        );
        assert_eq!(sink.list("machines").unwrap().len(), 2);
    }

    #[test]
    fn replace_supersedes_previous_contents() {
        let mut sink = RecordingSink::default();
        let schema = CollectionSchema::default();
        replace_collection(&mut sink, "machines", &schema, &[doc("old", serde_json::json!({}))])
            .unwrap();
        replace_collection(&mut sink, "machines", &schema, &[doc("new", serde_json::json!({}))])
            .unwrap();

        assert!(sink.get("machines", "old").unwrap().is_none());
        assert!(sink.get("machines", "new").unwrap().is_some());
    }

    #[test]
    fn replace_stops_at_first_failure() {
        let mut sink = RecordingSink {
            fail_on: Some("create_collection"),
            ..RecordingSink::default()
        };

        let result = replace_collection(
            &mut sink,
            "machines",
            &CollectionSchema::default(),
            &[doc("a", serde_json::json!({}))],
        );

        assert!(result.is_err());
        assert_eq!(
            sink.calls,
            vec!["delete_collection:machines", "create_collection:machines"]
        );
    }

    #[test]
    fn replace_with_no_documents_leaves_empty_collection() {
        let mut sink = RecordingSink::default();
        let written =
            replace_collection(&mut sink, "machines", &CollectionSchema::default(), &[]).unwrap();

        assert_eq!(written, 0);
        assert!(sink.list("machines").unwrap().is_empty());
    }
}
