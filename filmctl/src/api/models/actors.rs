//! API response models for actors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::actors::ActorDBResponse;
use crate::types::ActorId;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActorResponse {
    pub id: ActorId,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
}

impl From<ActorDBResponse> for ActorResponse {
    fn from(db: ActorDBResponse) -> Self {
        Self {
            id: db.id,
            first_name: db.first_name,
            last_name: db.last_name,
            birthdate: db.birthdate,
        }
    }
}
