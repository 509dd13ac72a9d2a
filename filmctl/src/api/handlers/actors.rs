use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::models::{
        actors::ActorResponse,
        films::FilmResponse,
        pagination::{PaginatedResponse, Pagination},
        responses::DataResponse,
    },
    db::handlers::{Actors, Films, Repository, actors::ActorFilter},
    errors::Error,
    types::parse_id,
};

/// List actors
#[utoipa::path(
    get,
    path = "/actors",
    tag = "actors",
    params(Pagination),
    responses(
        (status = 200, description = "Page of actors", body = PaginatedResponse<ActorResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_actors(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<ActorResponse>>, Error> {
    let (skip, limit) = pagination.params();
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Actors::new(&mut conn);
    let actors = repo.list(&ActorFilter::new(skip, limit)).await?;
    let total_count = repo.count().await?;

    Ok(Json(PaginatedResponse::new(
        actors.into_iter().map(ActorResponse::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

/// Get an actor
#[utoipa::path(
    get,
    path = "/actors/{id}",
    tag = "actors",
    params(("id" = i64, Path, description = "Actor ID")),
    responses(
        (status = 200, description = "Actor", body = DataResponse<ActorResponse>),
        (status = 404, description = "Actor not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_actor(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<DataResponse<ActorResponse>>, Error> {
    let not_found = || Error::NotFound {
        message: "Actor not found".to_string(),
    };
    let id = parse_id(&id).ok_or_else(not_found)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actor = Actors::new(&mut conn).get_by_id(id).await?.ok_or_else(not_found)?;

    Ok(Json(DataResponse::new(ActorResponse::from(actor))))
}

/// Films an actor appears in
#[utoipa::path(
    get,
    path = "/actors/{id}/films",
    tag = "actors",
    params(("id" = i64, Path, description = "Actor ID")),
    responses(
        (status = 200, description = "Films of the actor", body = DataResponse<Vec<FilmResponse>>),
        (status = 404, description = "No films found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_actor_films(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Vec<FilmResponse>>>, Error> {
    let no_films = || Error::NotFound {
        message: format!("No films found for actor ID {id}."),
    };
    let actor_id = parse_id(&id).ok_or_else(no_films)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let films = Films::new(&mut conn).list_for_actor(actor_id).await?;
    if films.is_empty() {
        return Err(no_films());
    }

    Ok(Json(DataResponse::new(films.into_iter().map(FilmResponse::from).collect())))
}
