// Postgres AuthStore over a sqlx connection pool.
//
// One parameterized query per contract method against the "User",
// "Account", and "Session" tables. The (provider, "providerAccountId")
// primary key and the unique email index are what make concurrent
// identical registrations safe; unique violations surface as
// StoreError::Duplicate. Schema migration tooling lives outside this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use torii_core::db::store::{AuthStore, NewAccount, NewUser, StoreError, UserUpdate};
use torii_core::{Account, Session, SessionWithUser, User};

#[derive(Debug, Clone)]
pub struct SqlxStore {
    pool: PgPool,
}

impl SqlxStore {
    /// Wrap an existing pool. The pool is the one cross-request shared
    /// resource; it is constructed by the caller and injected here.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| StoreError::Database(format!("connection failed: {e}")))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_error) = error {
        if db_error.is_unique_violation() {
            return StoreError::Duplicate(db_error.message().to_string());
        }
    }
    StoreError::Database(error.to_string())
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        image: row.try_get("image")?,
        created_at: row.try_get("createdAt")?,
        updated_at: row.try_get("updatedAt")?,
    })
}

fn account_from_row(row: &PgRow) -> Result<Account, sqlx::Error> {
    Ok(Account {
        provider: row.try_get("provider")?,
        provider_account_id: row.try_get("providerAccountId")?,
        provider_account_name: row.try_get("providerAccountName")?,
        user_id: row.try_get("userId")?,
    })
}

const USER_COLUMNS: &str = r#"id, name, email, password, image, "createdAt", "updatedAt""#;

#[async_trait]
impl AuthStore for SqlxStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            r#"SELECT {USER_COLUMNS} FROM "User" WHERE email = $1"#
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        row.map(|r| user_from_row(&r)).transpose().map_err(map_error)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            r#"SELECT {USER_COLUMNS} FROM "User" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        row.map(|r| user_from_row(&r)).transpose().map_err(map_error)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            r#"INSERT INTO "User" (id, name, email, password, image, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5, $6, $6)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(torii_core::id::generate_id())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.image)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_error)?;

        user_from_row(&row).map_err(map_error)
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            r#"UPDATE "User"
               SET name = COALESCE($2, name),
                   image = COALESCE($3, image),
                   password = COALESCE($4, password),
                   "updatedAt" = $5
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.image)
        .bind(&update.password)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        let row = row.ok_or(StoreError::NotFound)?;
        user_from_row(&row).map_err(map_error)
    }

    async fn find_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            r#"SELECT provider, "providerAccountId", "providerAccountName", "userId"
               FROM "Account"
               WHERE provider = $1 AND "providerAccountId" = $2"#,
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        row.map(|r| account_from_row(&r))
            .transpose()
            .map_err(map_error)
    }

    async fn create_account(
        &self,
        user_id: &str,
        account: NewAccount,
    ) -> Result<Account, StoreError> {
        let row = sqlx::query(
            r#"INSERT INTO "Account" (provider, "providerAccountId", "providerAccountName", "userId")
               VALUES ($1, $2, $3, $4)
               RETURNING provider, "providerAccountId", "providerAccountName", "userId""#,
        )
        .bind(&account.provider)
        .bind(&account.provider_account_id)
        .bind(&account.provider_account_name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_error)?;

        account_from_row(&row).map_err(map_error)
    }

    async fn update_account_name(
        &self,
        provider: &str,
        provider_account_id: &str,
        name: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"UPDATE "Account" SET "providerAccountName" = $3
               WHERE provider = $1 AND "providerAccountId" = $2"#,
        )
        .bind(provider)
        .bind(provider_account_id)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(map_error)?;
        Ok(())
    }

    async fn create_user_with_account(
        &self,
        user: NewUser,
        account: NewAccount,
    ) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_error)?;

        let now = Utc::now();
        let row = sqlx::query(&format!(
            r#"INSERT INTO "User" (id, name, email, password, image, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5, $6, $6)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(torii_core::id::generate_id())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.image)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_error)?;

        let created = user_from_row(&row).map_err(map_error)?;

        sqlx::query(
            r#"INSERT INTO "Account" (provider, "providerAccountId", "providerAccountName", "userId")
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(&account.provider)
        .bind(&account.provider_account_id)
        .bind(&account.provider_account_name)
        .bind(&created.id)
        .execute(&mut *tx)
        .await
        .map_err(map_error)?;

        tx.commit().await.map_err(map_error)?;
        Ok(created)
    }

    async fn create_session(
        &self,
        token_hash: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let row = sqlx::query(
            r#"INSERT INTO "Session" ("sessionToken", "userId", expires)
               VALUES ($1, $2, $3)
               RETURNING "sessionToken", "userId", expires"#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_error)?;

        Ok(Session {
            token_hash: row.try_get("sessionToken").map_err(map_error)?,
            user_id: row.try_get("userId").map_err(map_error)?,
            expires_at: row.try_get("expires").map_err(map_error)?,
        })
    }

    async fn find_session_with_user(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionWithUser>, StoreError> {
        let row = sqlx::query(
            r#"SELECT s."sessionToken", s."userId", s.expires,
                      u.id, u.name, u.email, u.password, u.image, u."createdAt", u."updatedAt"
               FROM "Session" s
               INNER JOIN "User" u ON u.id = s."userId"
               WHERE s."sessionToken" = $1"#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_error)?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let session = Session {
            token_hash: row.try_get("sessionToken").map_err(map_error)?,
            user_id: row.try_get("userId").map_err(map_error)?,
            expires_at: row.try_get("expires").map_err(map_error)?,
        };
        let user = user_from_row(&row).map_err(map_error)?;

        Ok(Some(SessionWithUser { session, user }))
    }

    async fn update_session_expiry(
        &self,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(r#"UPDATE "Session" SET expires = $2 WHERE "sessionToken" = $1"#)
            .bind(token_hash)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM "Session" WHERE "sessionToken" = $1"#)
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM "Session" WHERE "userId" = $1"#)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_error)?;
        Ok(())
    }
}
