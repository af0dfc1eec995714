use anyhow::Context;
use serde_json::Value;

use super::{claims::Identity, repo_types::User, role::Role};
use crate::store::{new_document_id, timestamp_now, Document, DocumentStore, Fields};

pub const USERS_COLLECTION: &str = "users";

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
    pub role: Role,
}

impl User {
    fn from_document(doc: Document) -> anyhow::Result<User> {
        let mut user: User = serde_json::from_value(Value::Object(doc.fields))
            .with_context(|| format!("decode user {}", doc.id))?;
        user.id = doc.id;
        Ok(user)
    }

    /// Find a user by exact email.
    pub async fn find_by_email(store: &dyn DocumentStore, email: &str) -> anyhow::Result<Option<User>> {
        store
            .find_one_by(USERS_COLLECTION, "email", email)
            .await?
            .map(User::from_document)
            .transpose()
    }

    /// Create a user. `password` is written as given; see `password::for_storage`.
    pub async fn create(store: &dyn DocumentStore, new: NewUser<'_>) -> anyhow::Result<User> {
        let now = timestamp_now()?;
        let mut fields = Fields::new();
        fields.insert("email".into(), new.email.into());
        fields.insert("password".into(), new.password.into());
        fields.insert("name".into(), new.name.into());
        fields.insert("role".into(), new.role.as_str().into());
        fields.insert("createdAt".into(), now.clone().into());
        fields.insert("updatedAt".into(), now.into());
        let doc = store
            .insert(USERS_COLLECTION, &new_document_id(), fields)
            .await
            .context("create user")?;
        User::from_document(doc)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
            name: self.name.clone(),
        }
    }
}
