use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};

use super::{Document, DocumentStore, Fields};

/// Documents live in one `documents(collection, id, data jsonb)` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

#[derive(FromRow)]
struct DocumentRow {
    id: String,
    data: Json<Fields>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            fields: row.data.0,
        }
    }
}

impl PgDocumentStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, id: &str, fields: Fields) -> anyhow::Result<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            RETURNING id, data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&fields))
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("insert {collection}/{id}"))?;
        Ok(row.into())
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data
              FROM documents
             WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("get {collection}/{id}"))?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, collection: &str, order_by: &str) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data
              FROM documents
             WHERE collection = $1
             ORDER BY data ->> $2::text DESC NULLS LAST, id ASC
            "#,
        )
        .bind(collection)
        .bind(order_by)
        .fetch_all(&self.db)
        .await
        .with_context(|| format!("list {collection}"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_one_by(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data
              FROM documents
             WHERE collection = $1 AND data ->> $2::text = $3
             LIMIT 1
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("find {collection} by {field}"))?;
        Ok(row.map(Into::into))
    }

    async fn merge(&self, collection: &str, id: &str, patch: Fields) -> anyhow::Result<Option<Document>> {
        // jsonb `||` replaces top-level keys only.
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
               SET data = data || $3::jsonb
             WHERE collection = $1 AND id = $2
            RETURNING id, data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&patch))
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("merge {collection}/{id}"))?;
        Ok(row.map(Into::into))
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
             WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .execute(&self.db)
        .await
        .with_context(|| format!("delete {collection}/{id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

// These need a live Postgres: `DATABASE_URL=postgres://... cargo test -- --ignored`.
// `sqlx::test` creates a scratch database per test and applies ./migrations.
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn list_orders_descending_with_missing_last(db: PgPool) {
        let store = PgDocumentStore { db };
        store.insert("attendance", "a", fields(json!({ "date": "2025-06-14" }))).await.unwrap();
        store.insert("attendance", "b", fields(json!({ "date": "2025-06-16" }))).await.unwrap();
        store.insert("attendance", "c", fields(json!({ "status": "absent" }))).await.unwrap();
        store.insert("attendance", "d", fields(json!({ "date": "2025-06-15" }))).await.unwrap();
        store.insert("payments", "p", fields(json!({ "date": "2099-01-01" }))).await.unwrap();

        let ids: Vec<String> = store
            .list("attendance", "date")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn merge_replaces_top_level_keys_only(db: PgPool) {
        let store = PgDocumentStore { db };
        store
            .insert(
                "members",
                "m1",
                fields(json!({ "firstName": "Ali", "contact": { "phone": "1", "email": "a@x.io" } })),
            )
            .await
            .unwrap();

        let merged = store
            .merge("members", "m1", fields(json!({ "contact": { "phone": "2" }, "status": "active" })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(merged.fields["firstName"], "Ali");
        assert_eq!(merged.fields["status"], "active");
        assert_eq!(merged.fields["contact"], json!({ "phone": "2" }));
        assert_eq!(store.get("members", "m1").await.unwrap(), Some(merged));

        assert!(store.merge("members", "nope", Fields::new()).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn find_delete_and_unique_email(db: PgPool) {
        let store = PgDocumentStore { db };
        store.insert("users", "u1", fields(json!({ "email": "desk@gym.io" }))).await.unwrap();

        let found = store.find_one_by("users", "email", "desk@gym.io").await.unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert!(store.find_one_by("users", "email", "DESK@gym.io").await.unwrap().is_none());

        assert!(store
            .insert("users", "u2", fields(json!({ "email": "desk@gym.io" })))
            .await
            .is_err());

        assert!(store.delete("users", "u1").await.unwrap());
        assert!(!store.delete("users", "u1").await.unwrap());
        assert!(store.get("users", "u1").await.unwrap().is_none());
    }
}
