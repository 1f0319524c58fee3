use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

/// Hard cap on list fetches; the API exposes no pagination.
pub const FETCH_LIMIT: i64 = 1000;

/// StoreError
///
/// Any failure from the backing store. The underlying message is preserved
/// and surfaced verbatim to the caller as a 500 — there is no retry or
/// partial-failure handling, since each operation is a single atomic call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Store
///
/// Defines the abstract contract for all persistence operations: flat JSON
/// documents grouped into named collections, filtered by single-field
/// equality. Handlers interact with the data layer through this trait only,
/// so the backing implementation (Postgres, in-memory) can be swapped by
/// deployment configuration and test setup.
///
/// Filter fields used by the handlers (`id`, `page`, `user_id`,
/// `category_id`) are always string-valued. The `*_one` operations assume
/// the filter matches at most one document, which holds for the unique keys
/// (`id`, `page`) they are called with.
#[async_trait]
pub trait Store: Send + Sync {
    /// Lists documents in a collection, optionally filtered by exact
    /// field equality, capped at FETCH_LIMIT rows.
    async fn list(
        &self,
        collection: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<Value>, StoreError>;

    /// Fetches a single document by exact field equality.
    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Value>, StoreError>;

    /// Inserts a new document. The document must carry a string `id` field.
    async fn insert(&self, collection: &str, doc: &Value) -> Result<(), StoreError>;

    /// Merges `patch` into the matching document (top-level fields are
    /// overwritten, others kept) and returns the updated document, or None
    /// if nothing matched.
    async fn update_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        patch: &Value,
    ) -> Result<Option<Value>, StoreError>;

    /// Deletes the matching document; returns whether a row was affected.
    async fn delete_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError>;

    /// Replaces the matching document wholesale, inserting it when absent.
    /// Atomic: concurrent upserts of the same key never create duplicates.
    /// Rows written through this operation are keyed by the natural-key
    /// `value` rather than the document's `id` field.
    async fn upsert_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        doc: &Value,
    ) -> Result<(), StoreError>;
}

/// StoreState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type StoreState = Arc<dyn Store>;

fn doc_id(doc: &Value) -> String {
    doc.get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// --- The Real Implementation (Postgres) ---

/// PostgresStore
///
/// Backs the Store contract with a single `documents` table holding one
/// JSONB document per row, keyed by (collection, id). Field filters go
/// through the `->>` operator, so every query stays a single round trip and
/// no per-entity schema is required.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Provisions the documents table. Called at startup in local
    /// environments only; production schemas are managed externally.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                doc JSONB NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn list(
        &self,
        collection: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<Value>, StoreError> {
        let docs: Vec<Value> = match filter {
            Some((field, value)) => {
                sqlx::query_scalar(
                    r#"
                    SELECT doc FROM documents
                    WHERE collection = $1 AND doc->>$2::text = $3
                    ORDER BY doc->>'created_at'
                    LIMIT $4
                    "#,
                )
                .bind(collection)
                .bind(field)
                .bind(value)
                .bind(FETCH_LIMIT)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    r#"
                    SELECT doc FROM documents
                    WHERE collection = $1
                    ORDER BY doc->>'created_at'
                    LIMIT $2
                    "#,
                )
                .bind(collection)
                .bind(FETCH_LIMIT)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(docs)
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Value>, StoreError> {
        let doc: Option<Value> = sqlx::query_scalar(
            "SELECT doc FROM documents WHERE collection = $1 AND doc->>$2::text = $3 LIMIT 1",
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    async fn insert(&self, collection: &str, doc: &Value) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(doc_id(doc))
            .bind(doc)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        patch: &Value,
    ) -> Result<Option<Value>, StoreError> {
        // JSONB concatenation gives $set semantics: top-level patch fields
        // overwrite, everything else in the stored document survives.
        let doc: Option<Value> = sqlx::query_scalar(
            r#"
            UPDATE documents SET doc = doc || $4
            WHERE collection = $1 AND doc->>$2::text = $3
            RETURNING doc
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .bind(patch)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    async fn delete_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM documents WHERE collection = $1 AND doc->>$2::text = $3")
                .bind(collection)
                .bind(field)
                .bind(value)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_one(
        &self,
        collection: &str,
        _field: &str,
        value: &str,
        doc: &Value,
    ) -> Result<(), StoreError> {
        // The row is keyed by the natural-key value itself, so the existing
        // (collection, id) primary key turns the upsert into one atomic
        // statement: two concurrent first writes for the same key cannot
        // both insert.
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(collection)
        .bind(value)
        .bind(doc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// --- The In-Memory Implementation (For Tests) ---

/// MemoryStore
///
/// An in-memory Store used by tests and local experiments: a map of
/// collection name to document list behind an async RwLock. Preserves
/// insertion order, matching the created_at ordering of the Postgres
/// implementation for freshly inserted rows.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(doc: &Value, field: &str, value: &str) -> bool {
    doc.get(field).and_then(Value::as_str) == Some(value)
}

#[async_trait]
impl Store for MemoryStore {
    async fn list(
        &self,
        collection: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| match filter {
                        Some((field, value)) => matches(doc, field, value),
                        None => true,
                    })
                    .take(FETCH_LIMIT as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches(doc, field, value)))
            .cloned())
    }

    async fn insert(&self, collection: &str, doc: &Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        patch: &Value,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(doc) = docs.iter_mut().find(|doc| matches(doc, field, value)) else {
            return Ok(None);
        };
        if let (Value::Object(target), Value::Object(fields)) = (&mut *doc, patch) {
            for (key, val) in fields {
                target.insert(key.clone(), val.clone());
            }
        }
        Ok(Some(doc.clone()))
    }

    async fn delete_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(position) = docs.iter().position(|doc| matches(doc, field, value)) else {
            return Ok(false);
        };
        docs.remove(position);
        Ok(true)
    }

    async fn upsert_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        doc: &Value,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|existing| matches(existing, field, value)) {
            Some(existing) => *existing = doc.clone(),
            None => docs.push(doc.clone()),
        }
        Ok(())
    }
}
