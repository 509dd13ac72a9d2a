//! Database repository for films.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::films::{FilmCreateDBRequest, FilmDBResponse, FilmUpdateDBRequest},
};
use crate::types::{ActorId, FilmId, LanguageId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

/// Filter options for listing films
#[derive(Debug, Clone)]
pub struct FilmFilter {
    pub skip: i64,
    pub limit: i64,
    /// Case-insensitive substring match on the title
    pub title: Option<String>,
}

impl FilmFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, title: None }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(title) = &self.title {
            query.push(" AND LOWER(title) LIKE ");
            query.push_bind(format!("%{}%", title.to_lowercase()));
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct Film {
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

impl From<Film> for FilmDBResponse {
    fn from(film: Film) -> Self {
        Self {
            id: film.id,
            title: film.title,
            release_year: film.release_year,
            length: film.length,
            description: film.description,
            rating: film.rating,
            language_id: film.language_id,
            special_features: film.special_features,
            image: film.image,
            created_at: film.created_at,
            updated_at: film.updated_at,
        }
    }
}

pub struct Films<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Films<'c> {
    type CreateRequest = FilmCreateDBRequest;
    type UpdateRequest = FilmUpdateDBRequest;
    type Response = FilmDBResponse;
    type Id = FilmId;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let film = sqlx::query_as::<_, Film>(
            r#"
            INSERT INTO films (title, release_year, length, description, rating, language_id, special_features, image)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&request.title)
        .bind(request.release_year)
        .bind(request.length)
        .bind(&request.description)
        .bind(&request.rating)
        .bind(request.language_id)
        .bind(&request.special_features)
        .bind(&request.image)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(FilmDBResponse::from(film))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let film = sqlx::query_as::<_, Film>("SELECT * FROM films WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(film.map(FilmDBResponse::from))
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM films WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE films SET ");
        let mut set = query.separated(", ");

        if let Some(title) = &request.title {
            set.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(release_year) = request.release_year {
            set.push("release_year = ").push_bind_unseparated(release_year);
        }
        if let Some(length) = request.length {
            set.push("length = ").push_bind_unseparated(length);
        }
        if let Some(description) = &request.description {
            set.push("description = ").push_bind_unseparated(description.clone());
        }
        if let Some(rating) = &request.rating {
            set.push("rating = ").push_bind_unseparated(rating.clone());
        }
        if let Some(language_id) = request.language_id {
            set.push("language_id = ").push_bind_unseparated(language_id);
        }
        if let Some(special_features) = &request.special_features {
            set.push("special_features = ").push_bind_unseparated(special_features.clone());
        }
        if let Some(image) = &request.image {
            set.push("image = ").push_bind_unseparated(image.clone());
        }
        set.push("updated_at = CURRENT_TIMESTAMP");

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" RETURNING *");

        let film = query
            .build_query_as::<Film>()
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(FilmDBResponse::from(film))
    }
}

impl<'c> Films<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &FilmFilter) -> Result<Vec<FilmDBResponse>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM films WHERE 1=1");
        filter.push_conditions(&mut query);

        query.push(" ORDER BY id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let films = query.build_query_as::<Film>().fetch_all(&mut *self.db).await?;

        Ok(films.into_iter().map(FilmDBResponse::from).collect())
    }

    /// Count films matching the filter, ignoring pagination
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &FilmFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM films WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    pub async fn exists(&mut self, id: FilmId) -> Result<bool> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM films WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(found.is_some())
    }

    /// Films an actor appears in
    #[instrument(skip(self), err)]
    pub async fn list_for_actor(&mut self, actor_id: ActorId) -> Result<Vec<FilmDBResponse>> {
        let films = sqlx::query_as::<_, Film>(
            r#"
            SELECT f.* FROM films f
            JOIN actor_film af ON af.film_id = f.id
            WHERE af.actor_id = ?
            ORDER BY f.id
            "#,
        )
        .bind(actor_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(films.into_iter().map(FilmDBResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    fn create_request(title: &str) -> FilmCreateDBRequest {
        FilmCreateDBRequest {
            title: title.to_string(),
            release_year: 2006,
            length: 90,
            description: Some("A film".to_string()),
            rating: Some("PG".to_string()),
            language_id: 1,
            special_features: Some("Trailers".to_string()),
            image: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Films::new(&mut conn);

        let film = repo.create(&create_request("Academy Dinosaur")).await.unwrap();
        assert_eq!(film.title, "Academy Dinosaur");
        assert_eq!(film.release_year, 2006);
        assert!(film.image.is_none());

        let fetched = repo.get_by_id(film.id).await.unwrap().unwrap();
        assert_eq!(fetched.rating.as_deref(), Some("PG"));
        assert!(repo.exists(film.id).await.unwrap());
        assert!(!repo.exists(film.id + 1).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_language_is_foreign_key_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Films::new(&mut conn);

        let mut request = create_request("Nowhere");
        request.language_id = 999;
        assert!(matches!(repo.create(&request).await, Err(DbError::ForeignKeyViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_partial_update(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Films::new(&mut conn);
        let film = repo.create(&create_request("Before")).await.unwrap();

        let updated = repo
            .update(
                film.id,
                &FilmUpdateDBRequest {
                    title: Some("After".to_string()),
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "After");
        assert!(updated.description.is_none());
        // Untouched columns keep their values
        assert_eq!(updated.rating.as_deref(), Some("PG"));
        assert_eq!(updated.length, 90);

        let untouched = repo.update(film.id, &FilmUpdateDBRequest::default()).await.unwrap();
        assert_eq!(untouched.title, "After");

        let missing = repo.update(9999, &FilmUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_count_and_title_filter(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Films::new(&mut conn);
        for title in ["Ace Goldfinger", "Alien Center", "Golden Hour"] {
            repo.create(&create_request(title)).await.unwrap();
        }

        assert_eq!(repo.count(&FilmFilter::new(0, 10)).await.unwrap(), 3);
        let page = repo.list(&FilmFilter::new(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "Alien Center");

        let filter = FilmFilter::new(0, 10).with_title("GOLD");
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
        let titles: Vec<_> = repo.list(&filter).await.unwrap().into_iter().map(|f| f.title).collect();
        assert_eq!(titles, vec!["Ace Goldfinger", "Golden Hour"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Films::new(&mut conn);
        let film = repo.create(&create_request("Short Lived")).await.unwrap();

        assert!(repo.delete(film.id).await.unwrap());
        assert!(repo.get_by_id(film.id).await.unwrap().is_none());
        assert!(!repo.delete(film.id).await.unwrap());
    }
}
