//! API request/response models for films.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use crate::db::models::films::{FilmCreateDBRequest, FilmDBResponse, FilmUpdateDBRequest};
use crate::types::{FilmId, LanguageId};

/// Query parameters for `GET /films`
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListFilmsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on the title
    pub title: Option<String>,
}

/// Body of `POST /films`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FilmCreate {
    pub title: String,
    pub release_year: i64,
    /// Running time in minutes
    pub length: i64,
    pub description: Option<String>,
    pub rating: Option<String>,
    pub language_id: LanguageId,
    pub special_features: String,
    pub image: Option<String>,
}

impl From<FilmCreate> for FilmCreateDBRequest {
    fn from(film: FilmCreate) -> Self {
        Self {
            title: film.title,
            release_year: film.release_year,
            length: film.length,
            description: film.description,
            rating: film.rating,
            language_id: film.language_id,
            special_features: Some(film.special_features),
            image: film.image,
        }
    }
}

/// Body of `PUT /films/{id}`. Absent fields are left alone; `null` clears a nullable field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FilmUpdate {
    pub title: Option<String>,
    pub release_year: Option<i64>,
    pub length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub rating: Option<Option<String>>,
    pub language_id: Option<LanguageId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub special_features: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub image: Option<Option<String>>,
}

impl From<FilmUpdate> for FilmUpdateDBRequest {
    fn from(update: FilmUpdate) -> Self {
        Self {
            title: update.title,
            release_year: update.release_year,
            length: update.length,
            description: update.description,
            rating: update.rating,
            language_id: update.language_id,
            special_features: update.special_features,
            image: update.image,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FilmResponse {
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

impl From<FilmDBResponse> for FilmResponse {
    fn from(db: FilmDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            release_year: db.release_year,
            length: db.length,
            description: db.description,
            rating: db.rating,
            language_id: db.language_id,
            special_features: db.special_features,
            image: db.image,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
