//! Database models for bearer session tokens.

use crate::types::{SessionTokenId, UserId};
use chrono::{DateTime, Utc};

/// Database request for storing a freshly minted token
#[derive(Debug, Clone)]
pub struct SessionTokenCreateDBRequest {
    pub user_id: UserId,
    /// SHA-256 hex digest of the raw token
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Database response for a stored token
#[derive(Debug, Clone)]
pub struct SessionTokenDBResponse {
    pub id: SessionTokenId,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SessionTokenDBResponse {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
