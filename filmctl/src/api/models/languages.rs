//! API response models for languages.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::languages::LanguageDBResponse;
use crate::types::LanguageId;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LanguageResponse {
    pub id: LanguageId,
    /// ISO 639-1 code, e.g. `en`
    pub code: String,
    pub name: String,
}

impl From<LanguageDBResponse> for LanguageResponse {
    fn from(db: LanguageDBResponse) -> Self {
        Self {
            id: db.id,
            code: db.code,
            name: db.name,
        }
    }
}
