//! Database repository for bearer session tokens.
//!
//! Tokens are looked up by the SHA-256 digest of the raw value, never by the value itself.
//! Expiry is compared in Rust against `expires_at` so the check does not depend on how SQLite
//! formats timestamps.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::session_tokens::{SessionTokenCreateDBRequest, SessionTokenDBResponse},
    },
    types::{SessionTokenId, UserId},
};

#[derive(Debug, Clone, FromRow)]
struct SessionToken {
    id: SessionTokenId,
    user_id: UserId,
    token_hash: String,
    expires_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<SessionToken> for SessionTokenDBResponse {
    fn from(token: SessionToken) -> Self {
        Self {
            id: token.id,
            user_id: token.user_id,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            last_used_at: token.last_used_at,
            created_at: token.created_at,
        }
    }
}

pub struct SessionTokens<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> SessionTokens<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = request.user_id), err)]
    pub async fn create(&mut self, request: &SessionTokenCreateDBRequest) -> Result<SessionTokenDBResponse> {
        let token = sqlx::query_as::<_, SessionToken>(
            r#"
            INSERT INTO session_tokens (user_id, token_hash, expires_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.token_hash)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(token.into())
    }

    #[instrument(skip(self, token_hash), err)]
    pub async fn get_by_hash(&mut self, token_hash: &str) -> Result<Option<SessionTokenDBResponse>> {
        let token = sqlx::query_as::<_, SessionToken>("SELECT * FROM session_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(token.map(Into::into))
    }

    /// Tokens of a user that have not expired at `now`
    #[instrument(skip(self), err)]
    pub async fn list_active_for_user(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<SessionTokenDBResponse>> {
        let tokens = sqlx::query_as::<_, SessionToken>("SELECT * FROM session_tokens WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(tokens
            .into_iter()
            .map(SessionTokenDBResponse::from)
            .filter(|t| !t.is_expired_at(now))
            .collect())
    }

    #[instrument(skip(self), err)]
    pub async fn touch(&mut self, id: SessionTokenId, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE session_tokens SET last_used_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: SessionTokenId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM session_tokens WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every token of a user that has expired at `now`. Returns how many were removed.
    #[instrument(skip(self), err)]
    pub async fn purge_expired_for_user(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<u64> {
        let tokens = sqlx::query_as::<_, SessionToken>("SELECT * FROM session_tokens WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&mut *self.db)
            .await?;

        let mut removed = 0;
        for token in tokens.into_iter().map(SessionTokenDBResponse::from) {
            if token.is_expired_at(now) && self.delete(token.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
