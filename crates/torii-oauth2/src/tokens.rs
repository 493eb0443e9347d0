// Token endpoint response parsing.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Parsed token endpoint response.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
    pub id_token: Option<String>,
}

/// Wire shape of the token response (snake_case form fields).
#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
    id_token: Option<String>,
}

impl TokenResponse {
    /// Parse a raw provider token response. Returns `None` when no access
    /// token is present (an error response or a malformed body).
    pub fn from_value(data: &serde_json::Value) -> Option<Self> {
        let raw: RawTokenResponse = serde_json::from_value(data.clone()).ok()?;
        let access_token = raw.access_token?;

        let expires_at = raw
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));

        let scopes = raw
            .scope
            .map(|s| s.split(' ').map(String::from).collect())
            .unwrap_or_default();

        Some(Self {
            access_token,
            token_type: raw.token_type,
            refresh_token: raw.refresh_token,
            expires_at,
            scopes,
            id_token: raw.id_token,
        })
    }
}
