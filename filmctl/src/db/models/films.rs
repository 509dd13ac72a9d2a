//! Database models for films.

use crate::types::{FilmId, LanguageId};
use chrono::{DateTime, Utc};

/// Database request for creating a film
#[derive(Debug, Clone)]
pub struct FilmCreateDBRequest {
    pub title: String,
    pub release_year: i64,
    pub length: i64,
    pub description: Option<String>,
    pub rating: Option<String>,
    pub language_id: LanguageId,
    pub special_features: Option<String>,
    pub image: Option<String>,
}

/// Database request for a partial film update
///
/// `None` leaves a column unchanged; for nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct FilmUpdateDBRequest {
    pub title: Option<String>,
    pub release_year: Option<i64>,
    pub length: Option<i64>,
    pub description: Option<Option<String>>,
    pub rating: Option<Option<String>>,
    pub language_id: Option<LanguageId>,
    pub special_features: Option<Option<String>>,
    pub image: Option<Option<String>>,
}

/// Database response for a film
#[derive(Debug, Clone)]
pub struct FilmDBResponse {
    pub id: FilmId,
    pub title: String,
    pub release_year: i64,
    pub length: i64,
    pub description: Option<String>,
    pub rating: Option<String>,
    pub language_id: LanguageId,
    pub special_features: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
