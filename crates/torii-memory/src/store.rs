// In-memory AuthStore — typed vectors behind a tokio RwLock.
//
// Enforces the same uniqueness the SQL schema enforces (user email;
// (provider, providerAccountId); session token hash) so tests see the same
// failure modes as a real database. Data dies with the store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use torii_core::db::store::{AuthStore, NewAccount, NewUser, StoreError, UserUpdate};
use torii_core::{Account, Session, SessionWithUser, User};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    accounts: Vec<Account>,
    sessions: Vec<Session>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Test helpers ────────────────────────────────────────────

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn account_count(&self) -> usize {
        self.inner.read().await.accounts.len()
    }

    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn get_session(&self, token_hash: &str) -> Option<Session> {
        self.inner
            .read()
            .await
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash)
            .cloned()
    }

    /// Insert a session row directly, bypassing the manager. Tests use this
    /// to craft expiries around the refresh threshold.
    pub async fn insert_session(&self, session: Session) {
        self.inner.write().await.sessions.push(session);
    }
}

fn insert_user(inner: &mut Inner, user: NewUser) -> Result<User, StoreError> {
    if inner.users.iter().any(|u| u.email == user.email) {
        return Err(StoreError::Duplicate(format!(
            "user email {:?}",
            user.email
        )));
    }
    let now = Utc::now();
    let user = User {
        id: torii_core::id::generate_id(),
        name: user.name,
        email: user.email,
        password: user.password,
        image: user.image,
        created_at: now,
        updated_at: now,
    };
    inner.users.push(user.clone());
    Ok(user)
}

fn insert_account(
    inner: &mut Inner,
    user_id: &str,
    account: NewAccount,
) -> Result<Account, StoreError> {
    if inner
        .accounts
        .iter()
        .any(|a| a.provider == account.provider && a.provider_account_id == account.provider_account_id)
    {
        return Err(StoreError::Duplicate(format!(
            "account ({}, {})",
            account.provider, account.provider_account_id
        )));
    }
    let account = Account {
        provider: account.provider,
        provider_account_id: account.provider_account_id,
        provider_account_name: account.provider_account_name,
        user_id: user_id.to_string(),
    };
    inner.accounts.push(account.clone());
    Ok(account)
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        insert_user(&mut *self.inner.write().await, user)
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(image) = update.image {
            user.image = Some(image);
        }
        if let Some(password) = update.password {
            user.password = Some(password);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn find_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .accounts
            .iter()
            .find(|a| a.provider == provider && a.provider_account_id == provider_account_id)
            .cloned())
    }

    async fn create_account(
        &self,
        user_id: &str,
        account: NewAccount,
    ) -> Result<Account, StoreError> {
        insert_account(&mut *self.inner.write().await, user_id, account)
    }

    async fn update_account_name(
        &self,
        provider: &str,
        provider_account_id: &str,
        name: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(account) = inner
            .accounts
            .iter_mut()
            .find(|a| a.provider == provider && a.provider_account_id == provider_account_id)
        {
            account.provider_account_name = name.map(|n| n.to_string());
        }
        Ok(())
    }

    async fn create_user_with_account(
        &self,
        user: NewUser,
        account: NewAccount,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;

        // Check the account constraint before inserting the user so a
        // failure leaves nothing behind.
        if inner
            .accounts
            .iter()
            .any(|a| a.provider == account.provider && a.provider_account_id == account.provider_account_id)
        {
            return Err(StoreError::Duplicate(format!(
                "account ({}, {})",
                account.provider, account.provider_account_id
            )));
        }

        let user = insert_user(&mut inner, user)?;
        let user_id = user.id.clone();
        insert_account(&mut inner, &user_id, account)?;
        Ok(user)
    }

    async fn create_session(
        &self,
        token_hash: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.sessions.iter().any(|s| s.token_hash == token_hash) {
            return Err(StoreError::Duplicate("session token hash".into()));
        }
        let session = Session {
            token_hash: token_hash.to_string(),
            user_id: user_id.to_string(),
            expires_at,
        };
        inner.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session_with_user(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionWithUser>, StoreError> {
        let inner = self.inner.read().await;
        let session = match inner.sessions.iter().find(|s| s.token_hash == token_hash) {
            Some(session) => session.clone(),
            None => return Ok(None),
        };
        // Inner join: a session without its user does not surface.
        let user = match inner.users.iter().find(|u| u.id == session.user_id) {
            Some(user) => user.clone(),
            None => return Ok(None),
        };
        Ok(Some(SessionWithUser { session, user }))
    }

    async fn update_session_expiry(
        &self,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(session) = inner.sessions.iter_mut().find(|s| s.token_hash == token_hash) {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .sessions
            .retain(|s| s.token_hash != token_hash);
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .sessions
            .retain(|s| s.user_id != user_id);
        Ok(())
    }
}
