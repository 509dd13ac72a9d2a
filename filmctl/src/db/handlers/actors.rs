//! Database repository for actors and their film credits.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::actors::{ActorCreateDBRequest, ActorDBResponse, ActorUpdateDBRequest},
};
use crate::types::{ActorId, FilmId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct ActorFilter {
    pub skip: i64,
    pub limit: i64,
}

impl ActorFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

#[derive(Debug, Clone, FromRow)]
struct Actor {
    pub id: ActorId,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<Actor> for ActorDBResponse {
    fn from(actor: Actor) -> Self {
        Self {
            id: actor.id,
            first_name: actor.first_name,
            last_name: actor.last_name,
            birthdate: actor.birthdate,
            created_at: actor.created_at,
        }
    }
}

pub struct Actors<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Actors<'c> {
    type CreateRequest = ActorCreateDBRequest;
    type UpdateRequest = ActorUpdateDBRequest;
    type Response = ActorDBResponse;
    type Id = ActorId;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let actor = sqlx::query_as::<_, Actor>(
            "INSERT INTO actors (first_name, last_name, birthdate) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(request.birthdate)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(actor.into())
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let actor = sqlx::query_as::<_, Actor>("SELECT * FROM actors WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(actor.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM actors WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // birthdate is nullable, so it cannot go through COALESCE
        let actor = sqlx::query_as::<_, Actor>(
            r#"
            UPDATE actors SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                birthdate = CASE WHEN ? THEN ? ELSE birthdate END
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(request.birthdate.is_some())
        .bind(request.birthdate.flatten())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(actor.into())
    }
}

impl<'c> Actors<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &ActorFilter) -> Result<Vec<ActorDBResponse>> {
        let actors = sqlx::query_as::<_, Actor>("SELECT * FROM actors ORDER BY id LIMIT ? OFFSET ?")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(actors.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM actors")
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count.0)
    }

    /// Cast of a film, ordered by last name
    #[instrument(skip(self), err)]
    pub async fn list_for_film(&mut self, film_id: FilmId) -> Result<Vec<ActorDBResponse>> {
        let actors = sqlx::query_as::<_, Actor>(
            r#"
            SELECT a.* FROM actors a
            JOIN actor_film af ON af.actor_id = a.id
            WHERE af.film_id = ?
            ORDER BY a.last_name, a.first_name, a.id
            "#,
        )
        .bind(film_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(actors.into_iter().map(Into::into).collect())
    }

    /// Credit an actor on a film. Crediting twice is a no-op.
    #[instrument(skip(self), err)]
    pub async fn attach_to_film(&mut self, actor_id: ActorId, film_id: FilmId) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO actor_film (actor_id, film_id) VALUES (?, ?)")
            .bind(actor_id)
            .bind(film_id)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }
}
