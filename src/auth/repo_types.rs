use serde::{Deserialize, Serialize};

use super::role::Role;

/// User record in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip)]
    pub id: String,
    pub email: String,                // unique, case-sensitive
    #[serde(skip_serializing)]
    pub password: String,             // plaintext or Argon2 PHC, never exposed in JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}
