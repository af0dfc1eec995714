use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Staff roles. Stored and sent over the wire in lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Staff,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            r if r.eq_ignore_ascii_case("admin") => Ok(Role::Admin),
            r if r.eq_ignore_ascii_case("staff") => Ok(Role::Staff),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A set of roles allowed through an [`Authorized`](super::extractors::Authorized) gate.
pub trait RoleSet: 'static {
    const ALLOWED: &'static [Role];

    fn allows(role: Role) -> bool {
        Self::ALLOWED.contains(&role)
    }
}

/// Destructive operations.
pub struct AdminOnly;

impl RoleSet for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}
