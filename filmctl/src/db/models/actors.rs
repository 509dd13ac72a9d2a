//! Database models for actors.

use crate::types::ActorId;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone)]
pub struct ActorCreateDBRequest {
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ActorUpdateDBRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthdate: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone)]
pub struct ActorDBResponse {
    pub id: ActorId,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}
