use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Role a user holds in the valuation workflow.
///
/// Every role string that is not one of the named roles is a regional role,
/// scoped by district/state assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Avo,
    Admin,
    StateAdmin,
    SuperAdmin,
    Regional(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Avo => "AVO",
            Role::Admin => "Admin",
            Role::StateAdmin => "StateAdmin",
            Role::SuperAdmin => "SuperAdmin",
            Role::Regional(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "AVO" => Role::Avo,
            "Admin" => Role::Admin,
            "StateAdmin" => Role::StateAdmin,
            "SuperAdmin" => Role::SuperAdmin,
            _ => Role::Regional(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Canonical user record as returned by the user directory.
///
/// Assignment fields stay raw: depending on who wrote the record they are a
/// JSON array, a JSON-encoded string, or null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub role_id: Role,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assigned_states: Option<Value>,
    #[serde(default)]
    pub assigned_districts: Option<Value>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub role_id: String,
    pub name: Option<String>,
    pub assigned_states: Option<Value>,
    pub assigned_districts: Option<Value>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            role_id: Role::from(row.role_id),
            name: row.name,
            assigned_states: row.assigned_states,
            assigned_districts: row.assigned_districts,
        }
    }
}
