//! Schemaless per-collection persistence.
//!
//! Handlers only ever see the [`DocumentStore`] trait; the concrete backend is
//! picked once at startup and carried in `AppState`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use time::{macros::format_description, OffsetDateTime};
use uuid::Uuid;

pub type Fields = Map<String, Value>;

/// A stored document. Serializes flat as `{ "id": ..., ...fields }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, id: &str, fields: Fields) -> anyhow::Result<Document>;

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>>;

    /// All documents of `collection`, ordered by `order_by` descending.
    /// Documents without that field come last.
    async fn list(&self, collection: &str, order_by: &str) -> anyhow::Result<Vec<Document>>;

    /// First document whose top-level string `field` equals `value` exactly.
    async fn find_one_by(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Option<Document>>;

    /// Overwrites the top-level keys in `patch`, leaving the rest untouched.
    /// Returns `None` when the document does not exist.
    async fn merge(&self, collection: &str, id: &str, patch: Fields) -> anyhow::Result<Option<Document>>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<bool>;
}

pub fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// UTC timestamp with millisecond precision, e.g. `2025-06-15T09:30:00.000Z`.
/// Fixed width so that string order matches time order.
pub fn timestamp_now() -> anyhow::Result<String> {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    Ok(OffsetDateTime::now_utc().format(format)?)
}
