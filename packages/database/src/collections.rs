//! `DuckDB`-backed document collections.
//!
//! Each collection is a table holding the document id, the full JSON
//! payload in `_document`, and one `TEXT` column per schema field projected
//! out of the payload for ad-hoc SQL. A `_meta` table tracks each
//! collection's field list, record count and when it was last replaced.

use std::collections::BTreeMap;
use std::path::Path;

use duckdb::Connection;

use crate::DbError;
use crate::sink::{CollectionSchema, CollectionSink, Document};

/// Number of rows per INSERT chunk.
const CHUNK_SIZE: usize = 1_000;

/// A `DuckDB` database used as a [`CollectionSink`].
pub struct DuckDbCollections {
    conn: Connection,
}

impl DuckDbCollections {
    /// Opens (or creates) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the directory, connection or metadata table
    /// cannot be created.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            crate::paths::ensure_dir(parent)?;
        }

        log::debug!("Opening collection store {}", path.display());
        Self::init(Connection::open(path)?)
    }

    /// Opens a throwaway in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection cannot be created.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    /// The underlying connection, for ad-hoc queries.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Gets a metadata value from the `_meta` table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT value FROM _meta WHERE key = ?")?;
        match stmt.query_row([key], |row| row.get(0)) {
            Ok(v) => Ok(Some(v)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::DuckDb(e)),
        }
    }

    /// Sets a metadata value in the `_meta` table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the upsert fails.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO _meta (key, value) VALUES (?, ?)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
            duckdb::params![key, value],
        )?;
        Ok(())
    }

    /// Names of all collections, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn collection_names(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM _meta WHERE key LIKE '%.fields' ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_suffix(".fields").map(str::to_owned))
            .collect())
    }

    /// Number of documents stored in a collection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the collection is missing or the query fails.
    pub fn record_count(&self, name: &str) -> Result<u64, DbError> {
        self.fields(name)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT COUNT(*) FROM {}", quote(name)))?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// When the collection was last created by a replacement, if ever.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn last_replaced_at(
        &self,
        name: &str,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, DbError> {
        Ok(self
            .get_meta(&meta_key(name, "last_replaced_at"))?
            .and_then(|value| {
                chrono::DateTime::parse_from_rfc3339(&value)
                    .map_err(|e| log::warn!("Bad last_replaced_at for {name:?}: {e}"))
                    .ok()
            })
            .map(|dt| dt.with_timezone(&chrono::Utc)))
    }

    /// The collection's projected field names.
    fn fields(&self, name: &str) -> Result<Vec<String>, DbError> {
        validate_name(name)?;
        let raw = self
            .get_meta(&meta_key(name, "fields"))?
            .ok_or_else(|| DbError::MissingCollection {
                name: name.to_owned(),
            })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn update_record_count(&self, name: &str) -> Result<u64, DbError> {
        let count = self.record_count(name)?;
        self.set_meta(&meta_key(name, "record_count"), &count.to_string())?;
        Ok(count)
    }

    /// Upserts `documents` in chunks of multi-row INSERTs.
    fn insert_rows(
        &self,
        name: &str,
        fields: &[String],
        documents: &[&Document],
    ) -> Result<u64, DbError> {
        let columns = std::iter::once("id".to_owned())
            .chain(std::iter::once("_document".to_owned()))
            .chain(fields.iter().map(|field| quote(field)))
            .collect::<Vec<_>>();
        let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
        let updates = columns
            .iter()
            .skip(1)
            .map(|column| format!("{column} = EXCLUDED.{column}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut total = 0u64;

        for chunk in documents.chunks(CHUNK_SIZE) {
            let sql = format!(
                "INSERT INTO {} ({}) VALUES {} ON CONFLICT (id) DO UPDATE SET {updates}",
                quote(name),
                columns.join(", "),
                vec![placeholders.as_str(); chunk.len()].join(", "),
            );

            let mut stmt = self.conn.prepare(&sql)?;
            let mut param_idx = 1usize;

            for document in chunk {
                stmt.raw_bind_parameter(param_idx, &document.id)?;
                stmt.raw_bind_parameter(param_idx + 1, serde_json::to_string(&document.payload)?)?;
                param_idx += 2;

                for field in fields {
                    stmt.raw_bind_parameter(param_idx, project(&document.payload, field))?;
                    param_idx += 1;
                }
            }

            let rows = stmt.raw_execute()?;
            total += u64::try_from(rows).unwrap_or(0);
        }

        Ok(total)
    }
}

impl CollectionSink for DuckDbCollections {
    fn delete_collection(&mut self, name: &str) -> Result<(), DbError> {
        validate_name(name)?;
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", quote(name)))?;
        self.conn.execute(
            "DELETE FROM _meta WHERE key IN (?, ?, ?)",
            duckdb::params![
                meta_key(name, "fields"),
                meta_key(name, "record_count"),
                meta_key(name, "last_replaced_at"),
            ],
        )?;
        log::debug!("Deleted collection {name:?}");
        Ok(())
    }

    fn create_collection(&mut self, name: &str, schema: &CollectionSchema) -> Result<(), DbError> {
        validate_name(name)?;
        for field in &schema.fields {
            validate_name(field)?;
        }

        let mut sql = format!(
            "CREATE TABLE {} (\n    id TEXT NOT NULL PRIMARY KEY,\n    _document TEXT NOT NULL",
            quote(name)
        );
        for field in &schema.fields {
            sql.push_str(",\n    ");
            sql.push_str(&quote(field));
            sql.push_str(" TEXT");
        }
        sql.push_str("\n);");

        self.conn.execute_batch(&sql)?;
        self.set_meta(
            &meta_key(name, "fields"),
            &serde_json::to_string(&schema.fields)?,
        )?;
        self.set_meta(&meta_key(name, "record_count"), "0")?;
        self.set_meta(
            &meta_key(name, "last_replaced_at"),
            &chrono::Utc::now().to_rfc3339(),
        )?;

        log::debug!(
            "Created collection {name:?} with {} projected field(s)",
            schema.fields.len()
        );
        Ok(())
    }

    fn bulk_insert(&mut self, name: &str, documents: &[Document]) -> Result<u64, DbError> {
        let fields = self.fields(name)?;
        if documents.is_empty() {
            return Ok(0);
        }

        // Keep the last occurrence of each id; one statement may not touch
        // the same key twice.
        let mut last_seen: BTreeMap<&str, usize> = BTreeMap::new();
        for (i, document) in documents.iter().enumerate() {
            last_seen.insert(&document.id, i);
        }
        let deduped: Vec<&Document> = documents
            .iter()
            .enumerate()
            .filter(|(i, document)| last_seen.get(document.id.as_str()) == Some(i))
            .map(|(_, document)| document)
            .collect();

        if deduped.len() < documents.len() {
            log::warn!(
                "Deduplicated insert into {name:?}: {} -> {} documents",
                documents.len(),
                deduped.len(),
            );
        }

        let written = self.insert_rows(name, &fields, &deduped)?;
        self.update_record_count(name)?;

        Ok(written)
    }

    fn get(&self, name: &str, id: &str) -> Result<Option<Document>, DbError> {
        self.fields(name)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT _document FROM {} WHERE id = ?", quote(name)))?;
        let payload: String = match stmt.query_row([id], |row| row.get(0)) {
            Ok(payload) => payload,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(DbError::DuckDb(e)),
        };

        Ok(Some(Document {
            id: id.to_owned(),
            payload: serde_json::from_str(&payload)?,
        }))
    }

    fn list(&self, name: &str) -> Result<Vec<Document>, DbError> {
        self.fields(name)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, _document FROM {} ORDER BY id",
            quote(name)
        ))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, payload)| {
                Ok(Document {
                    id,
                    payload: serde_json::from_str(&payload)?,
                })
            })
            .collect()
    }

    fn upsert(&mut self, name: &str, document: &Document) -> Result<(), DbError> {
        let fields = self.fields(name)?;
        self.insert_rows(name, &fields, &[document])?;
        self.update_record_count(name)?;
        Ok(())
    }

    fn delete(&mut self, name: &str, id: &str) -> Result<bool, DbError> {
        self.fields(name)?;
        let rows = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?", quote(name)),
            [id],
        )?;
        self.update_record_count(name)?;
        Ok(rows > 0)
    }
}

/// Accepts `[A-Za-z][A-Za-z0-9_]*`. Names starting with `_` belong to the
/// store itself (`_meta`) and are rejected.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionName`] for anything else.
pub fn validate_name(name: &str) -> Result<(), DbError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidCollectionName {
            name: name.to_owned(),
        })
    }
}

/// Quotes a validated identifier, preserving its case.
fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn meta_key(name: &str, key: &str) -> String {
    format!("{name}.{key}")
}

/// Text value of a top-level payload field. Strings are taken verbatim,
/// other scalars in their JSON form; null and missing fields give `None`.
fn project(payload: &serde_json::Value, field: &str) -> Option<String> {
    match payload.get(field)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
