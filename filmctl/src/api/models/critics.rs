//! API request/response models for critics.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::critics::CriticDBResponse;
use crate::types::{CriticId, FilmId, UserId};

/// Body of `POST /critics`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CriticCreate {
    pub film_id: FilmId,
    /// 0 to 10 inclusive
    pub score: f64,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CriticResponse {
    pub id: CriticId,
    pub user_id: UserId,
    pub film_id: FilmId,
    pub score: f64,
    pub comment: String,
}

impl From<CriticDBResponse> for CriticResponse {
    fn from(db: CriticDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            film_id: db.film_id,
            score: db.score,
            comment: db.comment,
        }
    }
}
