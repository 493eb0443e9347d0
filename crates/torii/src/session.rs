// Session manager — the session state machine.
//
// A token moves through: absent → valid → refreshed (still valid) →
// expired → invalidated. Expired rows are reaped lazily on the next
// validation; there is no background sweep.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use torii_core::db::store::{AuthStore, StoreError};
use torii_core::User;

use crate::crypto::token::{generate_token, hash_token};

/// A freshly created session: the raw token (returned exactly once) and its
/// absolute expiry.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of validating a token. Absence of a session is a normal state,
/// not an error: `user` is `None` and `expires` is now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub expires: DateTime<Utc>,
}

impl SessionResult {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            expires: Utc::now(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Creates, validates (with sliding refresh), and invalidates sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AuthStore>,
    expires_in: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn AuthStore>, expires_in_secs: u64) -> Self {
        Self {
            store,
            expires_in: Duration::seconds(expires_in_secs as i64),
        }
    }

    /// Create a session for a user. Only the token's hash is persisted; the
    /// raw token goes back to the caller for cookie/header transport.
    pub async fn create(&self, user_id: &str) -> Result<NewSession, StoreError> {
        let token = generate_token();
        let token_hash = hash_token(&token);
        let expires_at = Utc::now() + self.expires_in;

        let session = self
            .store
            .create_session(&token_hash, user_id, expires_at)
            .await?;

        Ok(NewSession {
            token,
            expires_at: session.expires_at,
        })
    }

    /// Validate a raw token.
    ///
    /// Expired sessions are deleted on sight. A session past the half-TTL
    /// refresh threshold gets its expiry extended to now + TTL. Two
    /// concurrent validations may both refresh; both write now + TTL, so
    /// the race is benign and deliberately unlocked.
    pub async fn validate(&self, token: &str) -> Result<SessionResult, StoreError> {
        if token.is_empty() {
            return Ok(SessionResult::anonymous());
        }

        let token_hash = hash_token(token);
        let found = match self.store.find_session_with_user(&token_hash).await? {
            Some(found) => found,
            None => return Ok(SessionResult::anonymous()),
        };

        let now = Utc::now();
        let mut expires = found.session.expires_at;

        if now > expires {
            self.store.delete_session(&token_hash).await?;
            return Ok(SessionResult::anonymous());
        }

        if now >= expires - self.expires_in / 2 {
            expires = now + self.expires_in;
            self.store
                .update_session_expiry(&token_hash, expires)
                .await?;
        }

        Ok(SessionResult {
            user: Some(found.user),
            expires,
        })
    }

    /// Invalidate a session. Idempotent: invalidating an absent token is
    /// not an error.
    pub async fn invalidate(&self, token: &str) -> Result<(), StoreError> {
        self.store.delete_session(&hash_token(token)).await
    }

    /// Invalidate every session for a user ("sign out everywhere").
    pub async fn invalidate_all(&self, user_id: &str) -> Result<(), StoreError> {
        self.store.delete_sessions_for_user(user_id).await
    }
}
