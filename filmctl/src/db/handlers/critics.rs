//! Database repository for critics (film reviews).

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::critics::{CriticCreateDBRequest, CriticDBResponse, CriticUpdateDBRequest},
};
use crate::types::{CriticId, FilmId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

/// Filter for listing critics
#[derive(Debug, Clone, Default)]
pub struct CriticFilter {
    pub film_id: Option<FilmId>,
    pub user_id: Option<UserId>,
}

impl CriticFilter {
    pub fn for_film(film_id: FilmId) -> Self {
        Self {
            film_id: Some(film_id),
            user_id: None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct Critic {
    pub id: CriticId,
    pub user_id: UserId,
    pub film_id: FilmId,
    pub score: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<Critic> for CriticDBResponse {
    fn from(critic: Critic) -> Self {
        Self {
            id: critic.id,
            user_id: critic.user_id,
            film_id: critic.film_id,
            score: critic.score,
            comment: critic.comment,
            created_at: critic.created_at,
        }
    }
}

pub struct Critics<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Critics<'c> {
    type CreateRequest = CriticCreateDBRequest;
    type UpdateRequest = CriticUpdateDBRequest;
    type Response = CriticDBResponse;
    type Id = CriticId;

    #[instrument(skip(self, request), fields(user_id = request.user_id, film_id = request.film_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let critic = sqlx::query_as::<_, Critic>(
            "INSERT INTO critics (user_id, film_id, score, comment) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(request.user_id)
        .bind(request.film_id)
        .bind(request.score)
        .bind(&request.comment)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(critic.into())
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let critic = sqlx::query_as::<_, Critic>("SELECT * FROM critics WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(critic.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM critics WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let critic = sqlx::query_as::<_, Critic>(
            r#"
            UPDATE critics SET
                score = COALESCE(?, score),
                comment = COALESCE(?, comment)
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(request.score)
        .bind(&request.comment)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(critic.into())
    }
}

impl<'c> Critics<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn list(&mut self, filter: &CriticFilter) -> Result<Vec<CriticDBResponse>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM critics WHERE 1=1");
        if let Some(film_id) = filter.film_id {
            query.push(" AND film_id = ");
            query.push_bind(film_id);
        }
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ");
            query.push_bind(user_id);
        }
        query.push(" ORDER BY id");

        let critics = query.build_query_as::<Critic>().fetch_all(&mut *self.db).await?;
        Ok(critics.into_iter().map(Into::into).collect())
    }

    /// Whether `user_id` has already reviewed `film_id`
    #[instrument(skip(self), err)]
    pub async fn exists_for_user_and_film(&mut self, user_id: UserId, film_id: FilmId) -> Result<bool> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM critics WHERE user_id = ? AND film_id = ? LIMIT 1")
            .bind(user_id)
            .bind(film_id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_film, create_test_user};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_list_and_existence(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let other = create_test_user(&pool, Role::User).await;
        let film = create_test_film(&pool, "Academy Dinosaur").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Critics::new(&mut conn);

        assert!(!repo.exists_for_user_and_film(user.id, film.id).await.unwrap());

        repo.create(&CriticCreateDBRequest {
            user_id: user.id,
            film_id: film.id,
            score: 8.0,
            comment: "Great".to_string(),
        })
        .await
        .unwrap();
        repo.create(&CriticCreateDBRequest {
            user_id: other.id,
            film_id: film.id,
            score: 6.0,
            comment: "Fine".to_string(),
        })
        .await
        .unwrap();

        assert!(repo.exists_for_user_and_film(user.id, film.id).await.unwrap());
        assert_eq!(repo.list(&CriticFilter::for_film(film.id)).await.unwrap().len(), 2);
        let mine = repo
            .list(&CriticFilter {
                user_id: Some(user.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].comment, "Great");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_score_out_of_range_is_check_violation(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let film = create_test_film(&pool, "Alien Center").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Critics::new(&mut conn);

        let result = repo
            .create(&CriticCreateDBRequest {
                user_id: user.id,
                film_id: film.id,
                score: 11.0,
                comment: "Off the scale".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DbError::CheckViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_critics_removed_with_film(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let film = create_test_film(&pool, "Short Lived").await;
        let mut conn = pool.acquire().await.unwrap();

        let critic = Critics::new(&mut conn)
            .create(&CriticCreateDBRequest {
                user_id: user.id,
                film_id: film.id,
                score: 5.5,
                comment: "Meh".to_string(),
            })
            .await
            .unwrap();

        sqlx::query("DELETE FROM films WHERE id = ?")
            .bind(film.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        assert!(Critics::new(&mut conn).get_by_id(critic.id).await.unwrap().is_none());
    }
}
