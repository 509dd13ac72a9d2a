use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        critics::{CriticCreate, CriticResponse},
        responses::{DataResponse, MessageDataResponse},
        users::CurrentUser,
    },
    auth::permissions,
    db::{
        handlers::{Critics, Films, Repository},
        models::critics::CriticCreateDBRequest,
    },
    errors::Error,
    types::parse_id,
    validation::{Payload, Validator},
};

const MAX_COMMENT_LENGTH: usize = 1000;

/// Submit a critic for a film
///
/// A user may review each film once.
#[utoipa::path(
    post,
    path = "/critics",
    tag = "critics",
    request_body = CriticCreate,
    responses(
        (status = 201, description = "Critic created", body = MessageDataResponse<CriticResponse>),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Film already reviewed by the caller"),
        (status = 422, description = "Invalid input"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_critic(
    State(state): State<AppState>,
    current_user: CurrentUser,
    payload: Payload,
) -> Result<(StatusCode, Json<MessageDataResponse<CriticResponse>>), Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut v = Validator::new(&payload);
    let film_id = v.integer("film_id");
    let film_id = v.required("film_id", film_id);
    let score = v.number("score");
    let score = v.required("score", score);
    v.between("score", score, 0.0, 10.0);
    let comment = v.string("comment");
    let comment = v.required("comment", comment);
    v.max_chars("comment", comment.as_deref(), MAX_COMMENT_LENGTH);

    if let Some(id) = film_id.filter(|_| !v.has_error("film_id")) {
        if !Films::new(&mut conn).exists(id).await? {
            v.exists_failed("film_id");
        }
    }
    let request = v.finish(|| {
        Some(CriticCreate {
            film_id: film_id?,
            score: score?,
            comment: comment?,
        })
    })?;

    permissions::require_not_already_reviewed(&mut conn, &current_user, request.film_id).await?;

    let critic = Critics::new(&mut conn)
        .create(&CriticCreateDBRequest {
            user_id: current_user.id,
            film_id: request.film_id,
            score: request.score,
            comment: request.comment,
        })
        .await?;
    tracing::info!(critic_id = critic.id, film_id = critic.film_id, "Critic created");

    Ok((
        StatusCode::CREATED,
        Json(MessageDataResponse::new("Critic created successfully", CriticResponse::from(critic))),
    ))
}

/// Get a critic
#[utoipa::path(
    get,
    path = "/critics/{id}",
    tag = "critics",
    params(("id" = i64, Path, description = "Critic ID")),
    responses(
        (status = 200, description = "Critic", body = DataResponse<CriticResponse>),
        (status = 404, description = "Critic not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_critic(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<DataResponse<CriticResponse>>, Error> {
    let not_found = || Error::NotFound {
        message: "Critic not found".to_string(),
    };
    let id = parse_id(&id).ok_or_else(not_found)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let critic = Critics::new(&mut conn).get_by_id(id).await?.ok_or_else(not_found)?;

    Ok(Json(DataResponse::new(CriticResponse::from(critic))))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_critic(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::User).await;
        let token = login_as(&pool, &user).await;
        let film = create_test_film(&pool, "Academy Dinosaur").await;

        let response = server
            .post("/critics")
            .authorization_bearer(&token)
            .json(&json!({"film_id": film.id, "score": 8.5, "comment": "Great film"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["message"], "Critic created successfully");
        assert_eq!(body["data"]["user_id"], user.id);
        assert_eq!(body["data"]["film_id"], film.id);
        assert_eq!(body["data"]["score"], 8.5);
        assert_eq!(body["data"]["comment"], "Great film");

        let id = body["data"]["id"].as_i64().unwrap();
        let fetched: Value = server.get(&format!("/critics/{id}")).await.json();
        assert_eq!(fetched["data"]["comment"], "Great film");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_second_critic_for_same_film_is_forbidden(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::User).await;
        let token = login_as(&pool, &user).await;
        let film = create_test_film(&pool, "Academy Dinosaur").await;
        let body = json!({"film_id": film.id, "score": 5, "comment": "Fine"});

        server
            .post("/critics")
            .authorization_bearer(&token)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post("/critics").authorization_bearer(&token).json(&body).await;
        response.assert_status(StatusCode::FORBIDDEN);
        response.assert_json(&json!({"message": "User has already submitted a critic for this film."}));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM critics").fetch_one(&pool).await.unwrap();
        assert_eq!(count.0, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_critic_validation(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::User).await;
        let token = login_as(&pool, &user).await;

        let response = server
            .post("/critics")
            .authorization_bearer(&token)
            .json(&json!({"film_id": 9999, "score": 11, "comment": "x".repeat(1001)}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["errors"]["film_id"][0], "The selected film id is invalid.");
        assert_eq!(body["errors"]["score"][0], "The score field must not be greater than 10.");
        assert_eq!(
            body["errors"]["comment"][0],
            "The comment field must not be greater than 1000 characters."
        );

        let response = server.post("/critics").authorization_bearer(&token).await;
        let body: Value = response.json();
        assert_eq!(body["message"], "The film id field is required. (and 2 more errors)");

        server.post("/critics").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_score_bounds_are_inclusive(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let film = create_test_film(&pool, "Academy Dinosaur").await;

        for score in [0.0, 10.0] {
            let user = create_test_user(&pool, Role::User).await;
            let token = login_as(&pool, &user).await;
            server
                .post("/critics")
                .authorization_bearer(&token)
                .json(&json!({"film_id": film.id, "score": score, "comment": "Edge"}))
                .await
                .assert_status(StatusCode::CREATED);
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_missing_critic(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let response = server.get("/critics/42").await;
        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({"message": "Critic not found"}));
    }
}
