//! User record

use serde::{Deserialize, Serialize};

use crate::generate_id;

/// A task owner; `email` is where notifications go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl User {
    /// Create a new user with a generated ID
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_id(generate_id(), email, name)
    }

    /// Create a user with a specific ID
    pub fn with_id(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
        }
    }
}
