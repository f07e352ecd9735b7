//! Bearer-token authentication against the platform login endpoint.
//!
//! The login response wraps the token differently across deployments, so
//! extraction checks the common fields before giving up.

use serde::Serialize;
use serde_json::Value;

/// Login request body for `POST /api/Authenticate/Login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }
}

/// Pull a bearer token out of a login response.
///
/// Accepts `token` or `access_token` at the top level, or either of those
/// nested under `data`.
pub fn extract_token(body: &Value) -> Option<String> {
    let direct = body.get("token").or_else(|| body.get("access_token"));
    if let Some(token) = direct.and_then(Value::as_str) {
        return Some(token.to_string());
    }

    let nested = body.get("data")?;
    nested
        .get("token")
        .or_else(|| nested.get("access_token"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
