//! Database models for critics.

use crate::types::{CriticId, FilmId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a critic
#[derive(Debug, Clone)]
pub struct CriticCreateDBRequest {
    pub user_id: UserId,
    pub film_id: FilmId,
    pub score: f64,
    pub comment: String,
}

/// Database request for updating a critic
#[derive(Debug, Clone, Default)]
pub struct CriticUpdateDBRequest {
    pub score: Option<f64>,
    pub comment: Option<String>,
}

/// Database response for a critic
#[derive(Debug, Clone)]
pub struct CriticDBResponse {
    pub id: CriticId,
    pub user_id: UserId,
    pub film_id: FilmId,
    pub score: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
