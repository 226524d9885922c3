//! Wire types for the KhetSetu backend API.
//!
//! Every endpoint responds with the same envelope shape; payloads are
//! validated at this boundary instead of being passed around as raw JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard response envelope: `{ success, data, message }`.
///
/// Non-2xx statuses other than 401 still carry this shape; callers inspect
/// `success` rather than relying on the HTTP status code.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Returns the server-provided message, or the fallback when absent.
    pub fn error_message(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Identity/profile record returned by the backend.
///
/// Held as a read-through cached copy in the session state and replaced
/// wholesale on every successful fetch or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub profile: Option<FarmProfile>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Farm attributes nested in the user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FarmProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_size_acres: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irrigation_source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primary_crops: Vec<String>,
}

/// Login/register success payload: user plus a fresh token pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh success payload: a new token pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub token: String,
    pub refresh_token: String,
}

/// Profile fetch/update payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileData {
    pub user: User,
}

/// Login credentials. Ephemeral — never persisted beyond the request.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Account creation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<FarmProfile>,
}

/// Partial profile update; only the supplied fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<FarmProfile>,
}

/// Password change request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}
