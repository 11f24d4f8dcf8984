// Wire types exchanged with the backend.

use serde::{Deserialize, Serialize};

/// Server-assigned record identifier.
pub type RecordId = i64;

/// A record as the server returns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyRecord {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub optional_field: Option<String>,
}

/// Body of a create or full-replace update. Never carries an id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    pub name: String,
    pub description: String,
    pub optional_field: Option<String>,
}

impl RecordPayload {
    /// Builds a payload, turning an empty optional field into `None`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        optional_field: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            optional_field: optional_field.filter(|v| !v.is_empty()),
        }
    }
}

/// Body of a partial update; unset fields are left out of the JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_field: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.optional_field.is_none()
    }
}

/// Login response from the token endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Registration payload. New accounts are always created enabled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub disabled: bool,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            full_name: full_name.into(),
            password: password.into(),
            disabled: false,
        }
    }
}

/// Response of both file listing endpoints.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileListing {
    #[serde(default)]
    pub files: Vec<String>,
}
