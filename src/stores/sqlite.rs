//! SQLite document store with vector search via `sqlite-vec`.
//!
//! One table per collection (`id`, `content`, `embedding`, `attributes`)
//! plus a `collection_meta` registry that pins each collection's vector
//! dimension. Attributes are stored as a JSON text column and queried
//! with `json_extract`; attribute keys are bound as JSON-path parameters,
//! never spliced into SQL. Distances come from `vec_distance_l2` over
//! `vec_f32`-encoded blobs.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;

use async_trait::async_trait;
use tokio_rusqlite::types::Value as SqlValue;
use tokio_rusqlite::{Connection, OptionalExtension, ffi, params_from_iter};
use uuid::Uuid;

use super::{DocumentStore, validate_identifier};
use crate::types::{AttributeMap, ChunkRow, DOCUMENT_ID_KEY, NewChunk, SearchMatch, StashError};

const META_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS collection_meta (\
     name TEXT PRIMARY KEY, \
     dimension INTEGER NOT NULL)";

fn rows_table_sql(collection: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{collection}\" (\
         id TEXT PRIMARY KEY, \
         content TEXT NOT NULL, \
         embedding BLOB NOT NULL, \
         attributes TEXT NOT NULL)"
    )
}

/// A compiled conjunctive equality predicate over the attribute bag.
///
/// `clause` is built only from fixed fragments; every caller-supplied key
/// becomes a bound `$.key` JSON path and every value a typed parameter.
struct FilterSql {
    clause: String,
    params: Vec<SqlValue>,
}

fn compile_filter(filter: &AttributeMap) -> Result<FilterSql, StashError> {
    let mut fragments = Vec::with_capacity(filter.len());
    let mut params = Vec::new();

    for (key, value) in filter {
        validate_identifier("attribute key", key)?;
        let path = format!("$.{key}");
        match value {
            serde_json::Value::Null => {
                fragments.push("json_extract(attributes, ?) IS NULL");
                params.push(SqlValue::Text(path));
            }
            serde_json::Value::Bool(flag) => {
                fragments.push("json_extract(attributes, ?) = ?");
                params.push(SqlValue::Text(path));
                params.push(SqlValue::Integer(i64::from(*flag)));
            }
            serde_json::Value::Number(number) => {
                fragments.push("json_extract(attributes, ?) = ?");
                params.push(SqlValue::Text(path));
                if let Some(integer) = number.as_i64() {
                    params.push(SqlValue::Integer(integer));
                } else {
                    params.push(SqlValue::Real(number.as_f64().unwrap_or_default()));
                }
            }
            serde_json::Value::String(text) => {
                fragments.push("json_extract(attributes, ?) = ?");
                params.push(SqlValue::Text(path));
                params.push(SqlValue::Text(text.clone()));
            }
            structured => {
                // Arrays and objects compare against SQLite's canonical
                // JSON text of the bound value.
                fragments.push("json_extract(attributes, ?) = json(?)");
                params.push(SqlValue::Text(path));
                params.push(SqlValue::Text(structured.to_string()));
            }
        }
    }

    let clause = if fragments.is_empty() {
        // Empty filter matches the whole collection.
        "1=1".to_string()
    } else {
        fragments.join(" AND ")
    };

    Ok(FilterSql { clause, params })
}

fn parse_attributes(raw: String) -> serde_json::Value {
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
}

fn storage_error(err: impl std::fmt::Display) -> StashError {
    StashError::Storage(err.to_string())
}

/// Document store over a single SQLite database.
///
/// Holds one background connection for its lifetime; every operation is a
/// self-contained call in autocommit mode, so each statement commits
/// independently. Only [`replace_document`](DocumentStore::replace_document)
/// opens an explicit transaction.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
    /// Open (or create) a database file and verify the vector extension.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StashError> {
        Self::register_sqlite_vec()?;
        let conn = Connection::open(path).await.map_err(storage_error)?;
        Self::with_connection(conn).await
    }

    /// In-memory database, private to this store instance.
    pub async fn open_in_memory() -> Result<Self, StashError> {
        Self::register_sqlite_vec()?;
        let conn = Connection::open_in_memory().await.map_err(storage_error)?;
        Self::with_connection(conn).await
    }

    /// Open from an explicit [`StoreConfig`](crate::config::StoreConfig).
    pub async fn from_config(config: &crate::config::StoreConfig) -> Result<Self, StashError> {
        Self::open(&config.db_path).await
    }

    async fn with_connection(conn: Connection) -> Result<Self, StashError> {
        conn.call(|conn| {
            conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
                .map(|_| ())
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
            conn.execute_batch(META_TABLE_SQL)
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(storage_error)?;
        Ok(Self { conn })
    }

    fn register_sqlite_vec() -> Result<(), StashError> {
        use std::sync::Mutex;

        static INIT: Once = Once::new();
        static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

        INIT.call_once(|| {
            let result = unsafe {
                type SqliteExtensionInit = unsafe extern "C" fn(
                    *mut ffi::sqlite3,
                    *mut *const c_char,
                    *const ffi::sqlite3_api_routines,
                ) -> i32;

                let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
                let init_fn: SqliteExtensionInit =
                    transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
                let rc = ffi::sqlite3_auto_extension(Some(init_fn));
                if rc != 0 {
                    Err(format!(
                        "failed to register sqlite-vec extension (code {rc})"
                    ))
                } else {
                    Ok(())
                }
            };
            *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
        });

        INIT_RESULT
            .lock()
            .expect("init result mutex poisoned")
            .clone()
            .expect("init was called but result not set")
            .map_err(StashError::Storage)
    }

    /// Create the collection table on first use and pin its dimension.
    /// Later writes with a different dimension fail before any row lands.
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> Result<(), StashError> {
        let create_sql = rows_table_sql(collection);
        let name = collection.to_string();
        let recorded = self
            .conn
            .call(move |conn| {
                conn.execute_batch(&create_sql)
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let existing: Option<i64> = conn
                    .query_row(
                        "SELECT dimension FROM collection_meta WHERE name = ?",
                        [&name],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                match existing {
                    Some(dim) => Ok(dim),
                    None => {
                        conn.execute(
                            "INSERT INTO collection_meta (name, dimension) VALUES (?, ?)",
                            params_from_iter([
                                SqlValue::Text(name),
                                SqlValue::Integer(dimension as i64),
                            ]),
                        )
                        .map_err(tokio_rusqlite::Error::Rusqlite)?;
                        Ok(dimension as i64)
                    }
                }
            })
            .await
            .map_err(storage_error)?;

        if recorded != dimension as i64 {
            return Err(StashError::Storage(format!(
                "embedding dimension {dimension} does not match collection \
                 '{collection}' dimension {recorded}"
            )));
        }
        Ok(())
    }

    /// Whether the collection's table exists, checked inside the closure
    /// so read paths can answer "missing collection" as an empty result.
    fn exists_sql() -> &'static str {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?"
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(&self, collection: &str, chunk: NewChunk) -> Result<String, StashError> {
        validate_identifier("collection", collection)?;
        self.ensure_collection(collection, chunk.embedding.len())
            .await?;

        let id = Uuid::new_v4().to_string();
        let sql = format!(
            "INSERT INTO \"{collection}\" (id, content, embedding, attributes) \
             VALUES (?, ?, vec_f32(?), ?)"
        );
        let embedding_json = serde_json::to_string(&chunk.embedding).map_err(storage_error)?;
        let attributes_json = serde_json::Value::Object(chunk.attributes).to_string();
        let row_id = id.clone();
        let content = chunk.content;

        self.conn
            .call(move |conn| {
                conn.execute(&sql, [&row_id, &content, &embedding_json, &attributes_json])
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(storage_error)?;

        Ok(id)
    }

    async fn delete_by_document_id(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<usize, StashError> {
        validate_identifier("collection", collection)?;
        let sql = format!(
            "DELETE FROM \"{collection}\" \
             WHERE json_extract(attributes, '$.{DOCUMENT_ID_KEY}') = ?"
        );
        let name = collection.to_string();
        let document_id = document_id.to_string();

        self.conn
            .call(move |conn| {
                let exists: Option<String> = conn
                    .query_row(Self::exists_sql(), [&name], |row| row.get(0))
                    .optional()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                if exists.is_none() {
                    return Ok(0);
                }
                conn.execute(&sql, [&document_id])
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(storage_error)
    }

    async fn preview_by_filter(
        &self,
        collection: &str,
        filter: &AttributeMap,
    ) -> Result<Vec<ChunkRow>, StashError> {
        validate_identifier("collection", collection)?;
        let filter_sql = compile_filter(filter)?;
        let sql = format!(
            "SELECT id, content, attributes FROM \"{collection}\" WHERE {}",
            filter_sql.clause
        );
        let name = collection.to_string();
        let params = filter_sql.params;

        self.conn
            .call(move |conn| {
                let exists: Option<String> = conn
                    .query_row(Self::exists_sql(), [&name], |row| row.get(0))
                    .optional()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                if exists.is_none() {
                    return Ok(Vec::new());
                }

                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map(params_from_iter(params), |row| {
                        Ok(ChunkRow {
                            id: row.get(0)?,
                            content: row.get(1)?,
                            attributes: parse_attributes(row.get::<_, String>(2)?),
                        })
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut matched = Vec::new();
                for row in rows {
                    matched.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(matched)
            })
            .await
            .map_err(storage_error)
    }

    async fn delete_by_filter(
        &self,
        collection: &str,
        filter: &AttributeMap,
    ) -> Result<usize, StashError> {
        validate_identifier("collection", collection)?;
        let filter_sql = compile_filter(filter)?;
        let sql = format!(
            "DELETE FROM \"{collection}\" WHERE {}",
            filter_sql.clause
        );
        let name = collection.to_string();
        let params = filter_sql.params;

        self.conn
            .call(move |conn| {
                let exists: Option<String> = conn
                    .query_row(Self::exists_sql(), [&name], |row| row.get(0))
                    .optional()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                if exists.is_none() {
                    return Ok(0);
                }
                conn.execute(&sql, params_from_iter(params))
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(storage_error)
    }

    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
        filter: &AttributeMap,
    ) -> Result<Vec<SearchMatch>, StashError> {
        validate_identifier("collection", collection)?;
        let filter_sql = compile_filter(filter)?;
        let sql = format!(
            "SELECT id, content, attributes, \
             vec_distance_l2(embedding, vec_f32(?)) AS distance \
             FROM \"{collection}\" WHERE {} \
             ORDER BY distance ASC LIMIT ?",
            filter_sql.clause
        );
        let embedding_json = serde_json::to_string(query_embedding).map_err(storage_error)?;
        let name = collection.to_string();

        let mut params = Vec::with_capacity(filter_sql.params.len() + 2);
        params.push(SqlValue::Text(embedding_json));
        params.extend(filter_sql.params);
        params.push(SqlValue::Integer(top_k as i64));

        self.conn
            .call(move |conn| {
                let exists: Option<String> = conn
                    .query_row(Self::exists_sql(), [&name], |row| row.get(0))
                    .optional()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                if exists.is_none() {
                    return Ok(Vec::new());
                }

                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map(params_from_iter(params), |row| {
                        Ok(SearchMatch {
                            id: row.get(0)?,
                            content: row.get(1)?,
                            attributes: parse_attributes(row.get::<_, String>(2)?),
                            distance: row.get(3)?,
                        })
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut matches = Vec::new();
                for row in rows {
                    matches.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(matches)
            })
            .await
            .map_err(storage_error)
    }

    async fn replace_document(
        &self,
        collection: &str,
        document_id: &str,
        rows: Vec<NewChunk>,
    ) -> Result<usize, StashError> {
        validate_identifier("collection", collection)?;

        if let Some(first) = rows.first() {
            let dimension = first.embedding.len();
            for row in &rows {
                if row.embedding.len() != dimension {
                    return Err(StashError::Storage(format!(
                        "chunk embeddings disagree on dimension ({} vs {dimension})",
                        row.embedding.len()
                    )));
                }
            }
            self.ensure_collection(collection, dimension).await?;
        }

        let mut staged = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding_json = serde_json::to_string(&row.embedding).map_err(storage_error)?;
            let attributes_json = serde_json::Value::Object(row.attributes).to_string();
            staged.push((
                Uuid::new_v4().to_string(),
                row.content,
                embedding_json,
                attributes_json,
            ));
        }

        let delete_sql = format!(
            "DELETE FROM \"{collection}\" \
             WHERE json_extract(attributes, '$.{DOCUMENT_ID_KEY}') = ?"
        );
        let insert_sql = format!(
            "INSERT INTO \"{collection}\" (id, content, embedding, attributes) \
             VALUES (?, ?, vec_f32(?), ?)"
        );
        let name = collection.to_string();
        let document_id = document_id.to_string();

        self.conn
            .call(move |conn| {
                let exists: Option<String> = conn
                    .query_row(Self::exists_sql(), [&name], |row| row.get(0))
                    .optional()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                if exists.is_none() {
                    // Nothing staged and nothing to delete.
                    return Ok(0);
                }

                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                tx.execute(&delete_sql, [&document_id])
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                for (id, content, embedding_json, attributes_json) in &staged {
                    tx.execute(&insert_sql, [id, content, embedding_json, attributes_json])
                        .map_err(tokio_rusqlite::Error::Rusqlite)?;
                }
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(staged.len())
            })
            .await
            .map_err(storage_error)
    }

    async fn count(&self, collection: &str) -> Result<usize, StashError> {
        validate_identifier("collection", collection)?;
        let sql = format!("SELECT COUNT(*) FROM \"{collection}\"");
        let name = collection.to_string();

        self.conn
            .call(move |conn| {
                let exists: Option<String> = conn
                    .query_row(Self::exists_sql(), [&name], |row| row.get(0))
                    .optional()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                if exists.is_none() {
                    return Ok(0);
                }
                let count: i64 = conn
                    .query_row(&sql, [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn attrs(value: serde_json::Value) -> AttributeMap {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object attributes, got {other}"),
        }
    }

    fn chunk(content: &str, embedding: Vec<f32>, attributes: serde_json::Value) -> NewChunk {
        NewChunk {
            content: content.to_string(),
            embedding,
            attributes: attrs(attributes),
        }
    }

    async fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::open_in_memory()
            .await
            .expect("in-memory store")
    }

    #[test]
    fn empty_filter_compiles_to_match_all() {
        let compiled = compile_filter(&AttributeMap::new()).unwrap();
        assert_eq!(compiled.clause, "1=1");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn filter_compiles_full_conjunction() {
        let filter = attrs(json!({"document_id": "d1", "lang": "en"}));
        let compiled = compile_filter(&filter).unwrap();
        assert_eq!(compiled.clause.matches(" AND ").count(), 1);
        assert_eq!(compiled.params.len(), 4);
    }

    #[test]
    fn filter_rejects_hostile_keys() {
        let filter = attrs(json!({"key') OR ('1'='1": "x"}));
        assert!(matches!(
            compile_filter(&filter),
            Err(StashError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn search_orders_by_distance_and_truncates() {
        let store = store().await;
        for (content, x) in [("origin", 0.0f32), ("near", 1.0), ("far", 3.0)] {
            store
                .insert(
                    "documents",
                    chunk(content, vec![x, 0.0], json!({"document_id": "d1"})),
                )
                .await
                .unwrap();
        }

        let matches = store
            .search("documents", &[0.0, 0.0], 2, &AttributeMap::new())
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].content, "origin");
        assert_eq!(matches[1].content, "near");
        assert!(matches[0].distance <= matches[1].distance);
    }

    #[tokio::test]
    async fn search_applies_every_filter_key() {
        let store = store().await;
        store
            .insert(
                "documents",
                chunk("a-en", vec![0.0], json!({"document_id": "a", "lang": "en"})),
            )
            .await
            .unwrap();
        store
            .insert(
                "documents",
                chunk("a-de", vec![0.0], json!({"document_id": "a", "lang": "de"})),
            )
            .await
            .unwrap();
        store
            .insert(
                "documents",
                chunk("b-en", vec![0.0], json!({"document_id": "b", "lang": "en"})),
            )
            .await
            .unwrap();

        let filter = attrs(json!({"document_id": "a", "lang": "en"}));
        let matches = store.search("documents", &[0.0], 10, &filter).await.unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].content, "a-en");
    }

    #[tokio::test]
    async fn search_on_missing_collection_is_empty() {
        let store = store().await;
        let matches = store
            .search("never_created", &[0.0, 0.0], 5, &AttributeMap::new())
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn numeric_and_bool_filter_values_match() {
        let store = store().await;
        store
            .insert(
                "documents",
                chunk(
                    "draft v2",
                    vec![0.0],
                    json!({"document_id": "d", "version": 2, "draft": true}),
                ),
            )
            .await
            .unwrap();

        for (filter, expected) in [
            (json!({"version": 2}), 1usize),
            (json!({"version": 3}), 0),
            (json!({"draft": true}), 1),
            (json!({"draft": false}), 0),
        ] {
            let matched = store
                .preview_by_filter("documents", &attrs(filter.clone()))
                .await
                .unwrap();
            assert_eq!(matched.len(), expected, "filter {filter}");
        }
    }

    #[tokio::test]
    async fn empty_filter_matches_every_row() {
        // Regression guard: an empty filter is an explicit full wipe.
        let store = store().await;
        for i in 0..3 {
            store
                .insert(
                    "documents",
                    chunk(&format!("row {i}"), vec![i as f32], json!({"document_id": "d"})),
                )
                .await
                .unwrap();
        }

        let previewed = store
            .preview_by_filter("documents", &AttributeMap::new())
            .await
            .unwrap();
        assert_eq!(previewed.len(), 3);

        let deleted = store
            .delete_by_filter("documents", &AttributeMap::new())
            .await
            .unwrap();
        assert_eq!(deleted, 3);
        assert_eq!(store.count("documents").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn preview_then_delete_removes_exactly_the_previewed_set() {
        let store = store().await;
        store
            .insert(
                "documents",
                chunk("en-1", vec![0.0], json!({"document_id": "a", "lang": "en"})),
            )
            .await
            .unwrap();
        store
            .insert(
                "documents",
                chunk("en-2", vec![0.0], json!({"document_id": "b", "lang": "en"})),
            )
            .await
            .unwrap();
        store
            .insert(
                "documents",
                chunk("de-1", vec![0.0], json!({"document_id": "c", "lang": "de"})),
            )
            .await
            .unwrap();

        let filter = attrs(json!({"lang": "en"}));
        let previewed = store.preview_by_filter("documents", &filter).await.unwrap();
        let deleted = store.delete_by_filter("documents", &filter).await.unwrap();

        assert_eq!(previewed.len(), 2);
        assert_eq!(deleted, previewed.len());

        let remaining = store
            .preview_by_filter("documents", &AttributeMap::new())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "de-1");
    }

    #[tokio::test]
    async fn replace_document_supersedes_prior_rows() {
        let store = store().await;
        let first = vec![
            chunk("old one", vec![0.1], json!({"document_id": "doc"})),
            chunk("old two", vec![0.2], json!({"document_id": "doc"})),
            chunk("old three", vec![0.3], json!({"document_id": "doc"})),
        ];
        store.replace_document("documents", "doc", first).await.unwrap();

        let second = vec![
            chunk("new one", vec![0.4], json!({"document_id": "doc"})),
            chunk("new two", vec![0.5], json!({"document_id": "doc"})),
        ];
        let written = store
            .replace_document("documents", "doc", second)
            .await
            .unwrap();

        assert_eq!(written, 2);
        let rows = store
            .preview_by_filter("documents", &attrs(json!({"document_id": "doc"})))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.content.starts_with("new")));
    }

    #[tokio::test]
    async fn delete_by_document_id_only_touches_that_document() {
        let store = store().await;
        store
            .insert("documents", chunk("keep", vec![0.0], json!({"document_id": "keep"})))
            .await
            .unwrap();
        store
            .insert("documents", chunk("drop", vec![0.0], json!({"document_id": "drop"})))
            .await
            .unwrap();

        let removed = store.delete_by_document_id("documents", "drop").await.unwrap();
        assert_eq!(removed, 1);

        let remaining = store
            .preview_by_filter("documents", &AttributeMap::new())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "keep");
    }

    #[tokio::test]
    async fn insert_never_deduplicates() {
        let store = store().await;
        let make = || chunk("same text", vec![1.0, 2.0], json!({"document_id": "d"}));
        let first = store.insert("documents", make()).await.unwrap();
        let second = store.insert("documents", make()).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.count("documents").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_a_storage_error() {
        let store = store().await;
        store
            .insert("documents", chunk("first", vec![0.0, 1.0], json!({"document_id": "d"})))
            .await
            .unwrap();

        let err = store
            .insert(
                "documents",
                chunk("second", vec![0.0, 1.0, 2.0], json!({"document_id": "d"})),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StashError::Storage(_)), "got {err:?}");
        assert_eq!(store.count("documents").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn hostile_collection_names_are_rejected() {
        let store = store().await;
        let err = store
            .insert(
                "documents; DROP TABLE documents",
                chunk("x", vec![0.0], json!({"document_id": "d"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StashError::Validation(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stash.db");

        {
            let store = SqliteDocumentStore::open(&path).await.unwrap();
            store
                .insert("documents", chunk("persisted", vec![0.5, 0.5], json!({"document_id": "d"})))
                .await
                .unwrap();
        }

        let reopened = SqliteDocumentStore::open(&path).await.unwrap();
        assert_eq!(reopened.count("documents").await.unwrap(), 1);
        let rows = reopened
            .preview_by_filter("documents", &AttributeMap::new())
            .await
            .unwrap();
        assert_eq!(rows[0].content, "persisted");
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let store = store().await;
        store
            .insert("alpha", chunk("in alpha", vec![0.0], json!({"document_id": "d"})))
            .await
            .unwrap();
        store
            .insert("beta", chunk("in beta", vec![0.0, 0.0, 0.0], json!({"document_id": "d"})))
            .await
            .unwrap();

        assert_eq!(store.count("alpha").await.unwrap(), 1);
        assert_eq!(store.count("beta").await.unwrap(), 1);

        let wiped = store.delete_by_filter("alpha", &AttributeMap::new()).await.unwrap();
        assert_eq!(wiped, 1);
        assert_eq!(store.count("beta").await.unwrap(), 1);
    }
}
