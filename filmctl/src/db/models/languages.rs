//! Database models for languages.

use crate::types::LanguageId;

#[derive(Debug, Clone)]
pub struct LanguageDBResponse {
    pub id: LanguageId,
    pub code: String,
    pub name: String,
}
