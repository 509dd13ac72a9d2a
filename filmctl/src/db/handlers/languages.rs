//! Database repository for languages.
//!
//! Languages are reference data seeded by migrations, so there is no write path.

use crate::db::{errors::Result, models::languages::LanguageDBResponse};
use crate::types::LanguageId;
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct Language {
    pub id: LanguageId,
    pub code: String,
    pub name: String,
}

impl From<Language> for LanguageDBResponse {
    fn from(language: Language) -> Self {
        Self {
            id: language.id,
            code: language.code,
            name: language.name,
        }
    }
}

pub struct Languages<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Languages<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<LanguageDBResponse>> {
        let languages = sqlx::query_as::<_, Language>("SELECT id, code, name FROM languages ORDER BY id")
            .fetch_all(&mut *self.db)
            .await?;
        Ok(languages.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: LanguageId) -> Result<Option<LanguageDBResponse>> {
        let language = sqlx::query_as::<_, Language>("SELECT id, code, name FROM languages WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(language.map(Into::into))
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_code(&mut self, code: &str) -> Result<Option<LanguageDBResponse>> {
        let language = sqlx::query_as::<_, Language>("SELECT id, code, name FROM languages WHERE code = ?")
            .bind(code)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(language.map(Into::into))
    }

    pub async fn exists(&mut self, id: LanguageId) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_seeded_languages(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Languages::new(&mut conn);

        let codes: Vec<_> = repo.list().await.unwrap().into_iter().map(|l| l.code).collect();
        assert_eq!(codes, vec!["en", "fr", "es"]);

        let french = repo.get_by_code("fr").await.unwrap().unwrap();
        assert_eq!(french.name, "French");
        assert!(repo.exists(french.id).await.unwrap());
        assert!(!repo.exists(999).await.unwrap());
        assert!(repo.get_by_code("xx").await.unwrap().is_none());
    }
}
