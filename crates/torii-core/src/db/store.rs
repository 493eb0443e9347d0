// AuthStore — the narrow query contract against the relational store.
//
// Everything the auth core needs from storage is expressed here; no storage
// engine detail leaks past this trait. Implementations live in torii-memory
// and torii-sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::models::{Account, Session, SessionWithUser, User};

/// Fields for inserting a new user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// Stored password hash (credential sign-up); absent for OAuth-only users.
    pub password: Option<String>,
    pub image: Option<String>,
}

/// Fields for linking a provider account. The owning user id is supplied
/// separately so the same value works for `create_account` and the atomic
/// `create_user_with_account`.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub provider: String,
    pub provider_account_id: String,
    pub provider_account_name: Option<String>,
}

/// Partial update of mutable user fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
    pub password: Option<String>,
}

/// Errors surfaced by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("record not found")]
    NotFound,
}

/// The storage contract consumed by the auth core.
#[async_trait]
pub trait AuthStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, StoreError>;

    // ─── Accounts ────────────────────────────────────────────────

    async fn find_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<Account>, StoreError>;

    async fn create_account(
        &self,
        user_id: &str,
        account: NewAccount,
    ) -> Result<Account, StoreError>;

    /// Refresh the cached provider display name on re-auth.
    async fn update_account_name(
        &self,
        provider: &str,
        provider_account_id: &str,
        name: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Insert a user and its first account atomically: if either insert
    /// fails, neither is committed.
    async fn create_user_with_account(
        &self,
        user: NewUser,
        account: NewAccount,
    ) -> Result<User, StoreError>;

    // ─── Sessions ────────────────────────────────────────────────

    async fn create_session(
        &self,
        token_hash: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    async fn find_session_with_user(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionWithUser>, StoreError>;

    async fn update_session_expiry(
        &self,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Delete a session row. Deleting an absent row is not an error.
    async fn delete_session(&self, token_hash: &str) -> Result<(), StoreError>;

    /// Delete every session belonging to a user ("sign out everywhere").
    async fn delete_sessions_for_user(&self, user_id: &str) -> Result<(), StoreError>;
}
