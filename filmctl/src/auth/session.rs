//! Bearer session lifecycle: registration, login, token resolution and logout.
//!
//! A user holds at most one live token. Logging in while a token is still unexpired is refused
//! rather than rotating the old one out, so a second device learns that a session exists. Expired
//! tokens neither authenticate nor count as live, and are purged the next time their owner logs
//! in.
//!
//! Raw tokens are handed to the client once and only their SHA-256 digest is stored.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::{
    api::models::users::{CurrentUser, Role},
    auth::password::{self, Argon2Params},
    config::Config,
    db::{
        handlers::{Repository, SessionTokens, Users},
        models::{
            session_tokens::SessionTokenCreateDBRequest,
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    errors::{Error, Result},
};

/// Same text for unknown logins and wrong passwords.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";
pub const ALREADY_LOGGED_IN: &str = "User already logged in";

/// SHA-256 hex digest of a raw token, as stored in `session_tokens.token_hash`.
pub fn hash_token(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// A freshly minted token. `access_token` is the only copy of the raw value.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub login: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Store a new account with role User. No token is issued.
#[instrument(skip_all, fields(login = %account.login), err)]
pub async fn register(db: &SqlitePool, config: &Config, account: NewAccount) -> Result<UserDBResponse> {
    let password_hash = password::hash_password(account.password, Argon2Params::from(&config.auth.password)).await?;

    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            login: account.login,
            email: account.email,
            password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            role: Role::User,
        })
        .await?;

    info!(user_id = user.id, "Registered user");
    Ok(user)
}

/// Verify credentials and mint a token, unless the user already holds a live one.
#[instrument(skip_all, fields(login = %login), err)]
pub async fn login(db: &SqlitePool, config: &Config, login: &str, password: String) -> Result<IssuedToken> {
    let failed = || Error::Unauthenticated {
        message: Some(AUTHENTICATION_FAILED.to_string()),
    };

    let mut tx = db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut tx).get_user_by_login(login).await?.ok_or_else(failed)?;
    if !password::verify_password(password, user.password_hash.clone()).await? {
        return Err(failed());
    }

    let now = Utc::now();
    let mut tokens = SessionTokens::new(&mut tx);
    let purged = tokens.purge_expired_for_user(user.id, now).await?;
    if purged > 0 {
        debug!(user_id = user.id, purged, "Purged expired session tokens");
    }
    if !tokens.list_active_for_user(user.id, now).await?.is_empty() {
        return Err(Error::Conflict {
            message: ALREADY_LOGGED_IN.to_string(),
        });
    }

    let lifetime = chrono::Duration::from_std(config.auth.session.timeout).map_err(|e| Error::Internal {
        operation: format!("convert session timeout: {e}"),
    })?;
    let access_token = password::generate_token();
    let expires_at = now + lifetime;
    tokens
        .create(&SessionTokenCreateDBRequest {
            user_id: user.id,
            token_hash: hash_token(&access_token),
            expires_at,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(user_id = user.id, "Issued session token");
    Ok(IssuedToken { access_token, expires_at })
}

/// Resolve a raw bearer token to its owner. Unknown or expired tokens are `Unauthenticated`.
#[instrument(skip_all, err)]
pub async fn authenticate(db: &SqlitePool, raw_token: &str) -> Result<CurrentUser> {
    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let now = Utc::now();

    let token = SessionTokens::new(&mut conn)
        .get_by_hash(&hash_token(raw_token))
        .await?
        .filter(|token| !token.is_expired_at(now))
        .ok_or(Error::Unauthenticated { message: None })?;

    // Role is looked up on every request, never cached in the token
    let user = Users::new(&mut conn)
        .get_by_id(token.user_id)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;

    SessionTokens::new(&mut conn).touch(token.id, now).await?;

    Ok(CurrentUser {
        id: user.id,
        login: user.login,
        email: user.email,
        role: user.role,
        token_id: token.id,
    })
}

/// Revoke exactly the token the caller presented.
#[instrument(skip_all, fields(user_id = user.id), err)]
pub async fn logout(db: &SqlitePool, user: &CurrentUser) -> Result<()> {
    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if !SessionTokens::new(&mut conn).delete(user.token_id).await? {
        // Revoked by a concurrent logout between authentication and here
        return Err(Error::Unauthenticated { message: None });
    }

    info!("Revoked session token");
    Ok(())
}
