// Typed records for the three durable tables: User, Account, Session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A local user identity.
///
/// The password hash never serializes: any `User` placed in a response body
/// ships without it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An external-identity link.
///
/// (provider, provider_account_id) is the composite identity; a pair maps to
/// at most one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub provider: String,
    pub provider_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_account_name: Option<String>,
    pub user_id: String,
}

/// A server-side session row.
///
/// `token_hash` is the primary key — the SHA-256 of the raw token. The raw
/// token itself is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token_hash: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// A session joined with its owning user.
#[derive(Debug, Clone)]
pub struct SessionWithUser {
    pub session: Session,
    pub user: User,
}
