use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Document, DocumentStore, Fields};

/// Process-local store. Backs `STORE_BACKEND=memory` and the test suite.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Fields>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_key(fields: &Fields, field: &str) -> Option<String> {
    match fields.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, id: &str, fields: Fields) -> anyhow::Result<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        anyhow::ensure!(!docs.contains_key(id), "document {collection}/{id} already exists");
        docs.insert(id.to_string(), fields.clone());
        Ok(Document {
            id: id.to_string(),
            fields,
        })
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn list(&self, collection: &str, order_by: &str) -> anyhow::Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        // Descending; `None` sorts below every `Some`, so missing fields land last.
        docs.sort_by(|a, b| {
            match sort_key(&b.fields, order_by).cmp(&sort_key(&a.fields, order_by)) {
                Ordering::Equal => a.id.cmp(&b.id),
                other => other,
            }
        });
        Ok(docs)
    }

    async fn find_one_by(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(_, fields)| fields.get(field).and_then(Value::as_str) == Some(value))
                .map(|(id, fields)| Document {
                    id: id.clone(),
                    fields: fields.clone(),
                })
        }))
    }

    async fn merge(&self, collection: &str, id: &str, patch: Fields) -> anyhow::Result<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(fields) = collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) else {
            return Ok(None);
        };
        fields.extend(patch);
        Ok(Some(Document {
            id: id.to_string(),
            fields: fields.clone(),
        }))
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }
}
