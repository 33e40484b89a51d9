#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Storage for extracted machine records.
//!
//! [`CollectionSink`] is the contract an import writes through;
//! [`DuckDbCollections`] implements it on a local `DuckDB` file. Each
//! import replaces the target collection wholesale with
//! [`replace_collection`].

pub mod collections;
pub mod machines;
pub mod paths;
pub mod sink;

pub use collections::DuckDbCollections;
pub use sink::{CollectionSchema, CollectionSink, Document, replace_collection};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` query or connection error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Payload (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Collection or field name outside `[A-Za-z][A-Za-z0-9_]*`.
    #[error("Invalid collection or field name: {name:?}")]
    InvalidCollectionName {
        /// The rejected name.
        name: String,
    },

    /// The collection has not been created.
    #[error("Collection {name:?} does not exist")]
    MissingCollection {
        /// The missing collection.
        name: String,
    },
}
