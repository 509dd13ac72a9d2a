use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::SqliteConnection;

use crate::{
    AppState,
    api::models::{
        actors::ActorResponse,
        critics::CriticResponse,
        films::{FilmCreate, FilmResponse, FilmUpdate, ListFilmsQuery},
        pagination::PaginatedResponse,
        responses::{DataResponse, MessageDataResponse, MessageResponse},
        users::CurrentUser,
    },
    auth::permissions,
    db::handlers::{
        Actors, Critics, Films, Languages, Repository, critics::CriticFilter, films::FilmFilter,
    },
    errors::Error,
    types::{FilmId, parse_id},
    validation::{Payload, Presence, Validator},
};

fn film_not_found() -> Error {
    Error::NotFound {
        message: "Film not found".to_string(),
    }
}

/// Every film field as sent, after type and length checks.
struct FilmFields {
    title: Presence<String>,
    release_year: Presence<i64>,
    length: Presence<i64>,
    description: Presence<String>,
    rating: Presence<String>,
    language_id: Presence<i64>,
    special_features: Presence<String>,
    image: Presence<String>,
}

fn read_film_fields(v: &mut Validator<'_>) -> FilmFields {
    let fields = FilmFields {
        title: v.string("title"),
        release_year: v.integer("release_year"),
        length: v.integer("length"),
        description: v.string("description"),
        rating: v.string("rating"),
        language_id: v.integer("language_id"),
        special_features: v.string("special_features"),
        image: v.string("image"),
    };
    v.max_chars("title", fields.title.as_value().map(String::as_str), 255);
    v.max_chars("rating", fields.rating.as_value().map(String::as_str), 10);
    v.max_chars("image", fields.image.as_value().map(String::as_str), 255);
    fields
}

/// `language_id` must name a seeded language.
async fn check_language(conn: &mut SqliteConnection, v: &mut Validator<'_>, language_id: Option<i64>) -> Result<(), Error> {
    if let Some(id) = language_id.filter(|_| !v.has_error("language_id")) {
        if !Languages::new(conn).exists(id).await? {
            v.exists_failed("language_id");
        }
    }
    Ok(())
}

/// List films
#[utoipa::path(
    get,
    path = "/films",
    tag = "films",
    params(ListFilmsQuery),
    responses(
        (status = 200, description = "Page of films", body = PaginatedResponse<FilmResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_films(
    State(state): State<AppState>,
    Query(query): Query<ListFilmsQuery>,
) -> Result<Json<PaginatedResponse<FilmResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let mut filter = FilmFilter::new(skip, limit);
    if let Some(title) = query.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        filter = filter.with_title(title);
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Films::new(&mut conn);
    let films = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        films.into_iter().map(FilmResponse::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

/// Get a film
#[utoipa::path(
    get,
    path = "/films/{id}",
    tag = "films",
    params(("id" = i64, Path, description = "Film ID")),
    responses(
        (status = 200, description = "Film", body = DataResponse<FilmResponse>),
        (status = 404, description = "Film not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_film(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<DataResponse<FilmResponse>>, Error> {
    let id = parse_id(&id).ok_or_else(film_not_found)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let film = Films::new(&mut conn).get_by_id(id).await?.ok_or_else(film_not_found)?;

    Ok(Json(DataResponse::new(FilmResponse::from(film))))
}

/// Add a film to the catalog
#[utoipa::path(
    post,
    path = "/films",
    tag = "films",
    request_body = FilmCreate,
    responses(
        (status = 201, description = "Film created", body = MessageDataResponse<FilmResponse>),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 422, description = "Invalid input"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_film(
    State(state): State<AppState>,
    current_user: CurrentUser,
    payload: Payload,
) -> Result<(StatusCode, Json<MessageDataResponse<FilmResponse>>), Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut v = Validator::new(&payload);
    let fields = read_film_fields(&mut v);
    let title = v.required("title", fields.title);
    let release_year = v.required("release_year", fields.release_year);
    let length = v.required("length", fields.length);
    let language_id = v.required("language_id", fields.language_id);
    let special_features = v.required("special_features", fields.special_features);
    check_language(&mut conn, &mut v, language_id).await?;
    let (description, rating, image) = (fields.description, fields.rating, fields.image);
    let request = v.finish(|| {
        Some(FilmCreate {
            title: title?,
            release_year: release_year?,
            length: length?,
            description: description.value(),
            rating: rating.value(),
            language_id: language_id?,
            special_features: special_features?,
            image: image.value(),
        })
    })?;

    permissions::require_admin(&current_user)?;

    let film = Films::new(&mut conn).create(&request.into()).await?;
    tracing::info!(film_id = film.id, "Film created");

    Ok((
        StatusCode::CREATED,
        Json(MessageDataResponse::new("Film created successfully", FilmResponse::from(film))),
    ))
}

/// Update some fields of a film
///
/// Absent fields are left unchanged; `null` clears description, rating, special features or image.
#[utoipa::path(
    put,
    path = "/films/{id}",
    tag = "films",
    params(("id" = i64, Path, description = "Film ID")),
    request_body = FilmUpdate,
    responses(
        (status = 200, description = "Film updated", body = MessageDataResponse<FilmResponse>),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Film not found"),
        (status = 422, description = "Invalid input"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_film(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<Json<MessageDataResponse<FilmResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut v = Validator::new(&payload);
    let fields = read_film_fields(&mut v);
    let title = v.sometimes_required("title", fields.title);
    let release_year = v.sometimes_required("release_year", fields.release_year);
    let length = v.sometimes_required("length", fields.length);
    let language_id = v.sometimes_required("language_id", fields.language_id);
    check_language(&mut conn, &mut v, language_id).await?;
    let (description, rating, special_features, image) =
        (fields.description, fields.rating, fields.special_features, fields.image);
    let update = v.finish(|| {
        Some(FilmUpdate {
            title,
            release_year,
            length,
            description: description.into_patch(),
            rating: rating.into_patch(),
            language_id,
            special_features: special_features.into_patch(),
            image: image.into_patch(),
        })
    })?;

    permissions::require_admin(&current_user)?;

    let id = parse_id(&id).ok_or_else(film_not_found)?;
    let mut repo = Films::new(&mut conn);
    if !repo.exists(id).await? {
        return Err(film_not_found());
    }
    let film = repo.update(id, &update.into()).await?;
    tracing::info!(film_id = film.id, "Film updated");

    Ok(Json(MessageDataResponse::new("Film updated successfully", FilmResponse::from(film))))
}

/// Remove a film together with its critics and cast links
#[utoipa::path(
    delete,
    path = "/films/{id}",
    tag = "films",
    params(("id" = i64, Path, description = "Film ID")),
    responses(
        (status = 200, description = "Film deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Film not found"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_film(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, Error> {
    permissions::require_admin(&current_user)?;

    let id = parse_id(&id).ok_or_else(film_not_found)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Films::new(&mut conn).delete(id).await? {
        return Err(film_not_found());
    }
    tracing::info!(film_id = id, "Film deleted");

    Ok(Json(MessageResponse::new("Film deleted successfully")))
}

async fn existing_film_id(conn: &mut SqliteConnection, raw: &str) -> Result<FilmId, Error> {
    let id = parse_id(raw).ok_or_else(film_not_found)?;
    if !Films::new(conn).exists(id).await? {
        return Err(film_not_found());
    }
    Ok(id)
}

/// Critics of a film
#[utoipa::path(
    get,
    path = "/films/{id}/critics",
    tag = "films",
    params(("id" = i64, Path, description = "Film ID")),
    responses(
        (status = 200, description = "Critics of the film", body = DataResponse<Vec<CriticResponse>>),
        (status = 404, description = "Film not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_film_critics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Vec<CriticResponse>>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let film_id = existing_film_id(&mut conn, &id).await?;

    let critics = Critics::new(&mut conn).list(&CriticFilter::for_film(film_id)).await?;
    Ok(Json(DataResponse::new(critics.into_iter().map(CriticResponse::from).collect())))
}

/// Cast of a film
#[utoipa::path(
    get,
    path = "/films/{id}/actors",
    tag = "films",
    params(("id" = i64, Path, description = "Film ID")),
    responses(
        (status = 200, description = "Actors in the film", body = DataResponse<Vec<ActorResponse>>),
        (status = 404, description = "No actors found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_film_actors(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Vec<ActorResponse>>>, Error> {
    let no_actors = || Error::NotFound {
        message: format!("No actors found for film ID {id}."),
    };
    let film_id = parse_id(&id).ok_or_else(no_actors)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let actors = Actors::new(&mut conn).list_for_film(film_id).await?;
    if actors.is_empty() {
        return Err(no_actors());
    }

    Ok(Json(DataResponse::new(actors.into_iter().map(ActorResponse::from).collect())))
}
