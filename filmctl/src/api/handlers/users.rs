use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    api::models::{
        responses::{DataResponse, MessageResponse},
        users::{CurrentUser, PasswordUpdate, UserResponse},
    },
    auth::{
        password::{self, Argon2Params},
        permissions,
    },
    db::{
        handlers::{Repository, Users},
        models::users::UserUpdateDBRequest,
    },
    errors::Error,
    types::parse_id,
    validation::{Payload, Validator},
};

fn user_not_found() -> Error {
    Error::NotFound {
        message: "User not found.".to_string(),
    }
}

/// Get a user's own profile
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = DataResponse<UserResponse>),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not the caller's profile"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<UserResponse>>, Error> {
    let id = parse_id(&id).ok_or_else(user_not_found)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(id).await?.ok_or_else(user_not_found)?;

    permissions::require_self(&current_user, user.id, "You can only view your own information.")?;

    Ok(Json(DataResponse::new(UserResponse::from(user))))
}

/// Change the caller's password
///
/// The caller's session stays valid.
#[utoipa::path(
    patch,
    path = "/users/{id}/password",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = PasswordUpdate,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not the caller's account"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Invalid input"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<Json<MessageResponse>, Error> {
    let rules = &state.config.auth.password;
    let mut v = Validator::new(&payload);
    let new_password = v.string("password");
    let new_password = v.required("password", new_password);
    v.min_chars("password", new_password.as_deref(), rules.min_length);
    v.max_chars("password", new_password.as_deref(), rules.max_length);
    v.confirmed("password", new_password.as_deref());
    let new_password = v.finish(|| new_password)?;

    let id = parse_id(&id).ok_or_else(user_not_found)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(id).await?.ok_or_else(user_not_found)?;

    permissions::require_self(&current_user, user.id, "You can only update your own password.")?;

    let password_hash = password::hash_password(new_password, Argon2Params::from(rules)).await?;
    Users::new(&mut conn)
        .update(
            user.id,
            &UserUpdateDBRequest {
                password_hash: Some(password_hash),
                role: None,
            },
        )
        .await?;

    tracing::info!(user_id = user.id, "Password updated");
    Ok(Json(MessageResponse::new("Password updated successfully.")))
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
    async fn test_get_own_profile(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::User).await;
        let token = login_as(&pool, &user).await;

        let response = server.get(&format!("/users/{}", user.id)).authorization_bearer(&token).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["id"], user.id);
        assert_eq!(body["data"]["email"], user.email.as_str());
        assert!(body["data"].get("password_hash").is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_other_profile_forbidden_even_for_admin(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::User).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let token = login_as(&pool, &admin).await;

        let response = server.get(&format!("/users/{}", user.id)).authorization_bearer(&token).await;

        response.assert_status(StatusCode::FORBIDDEN);
        response.assert_json(&json!({"message": "You can only view your own information."}));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_unknown_user_is_not_found(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::User).await;
        let token = login_as(&pool, &user).await;

        for path in ["/users/9999", "/users/not-a-number"] {
            let response = server.get(path).authorization_bearer(&token).await;
            response.assert_status(StatusCode::NOT_FOUND);
            response.assert_json(&json!({"message": "User not found."}));
        }

        server.get("/users/9999").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_password(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::User).await;
        let token = login_as(&pool, &user).await;

        let response = server
            .patch(&format!("/users/{}/password", user.id))
            .authorization_bearer(&token)
            .json(&json!({"password": "brand-new-pass", "password_confirmation": "brand-new-pass"}))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({"message": "Password updated successfully."}));

        // Caller's token still works
        server
            .get(&format!("/users/{}", user.id))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        let hash: (String,) = sqlx::query_as("SELECT password_hash FROM users WHERE id = ?")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(crate::auth::password::verify_string("brand-new-pass", &hash.0).unwrap());
        assert!(!crate::auth::password::verify_string(TEST_PASSWORD, &hash.0).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_password_validation_precedes_ownership(pool: SqlitePool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::User).await;
        let other = create_test_user(&pool, Role::User).await;
        let token = login_as(&pool, &user).await;

        let mismatch = server
            .patch(&format!("/users/{}/password", other.id))
            .authorization_bearer(&token)
            .json(&json!({"password": "brand-new-pass", "password_confirmation": "different-pass"}))
            .await;
        mismatch.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = mismatch.json();
        assert_eq!(body["errors"]["password"][0], "The password field confirmation does not match.");

        let forbidden = server
            .patch(&format!("/users/{}/password", other.id))
            .authorization_bearer(&token)
            .json(&json!({"password": "brand-new-pass", "password_confirmation": "brand-new-pass"}))
            .await;
        forbidden.assert_status(StatusCode::FORBIDDEN);
        forbidden.assert_json(&json!({"message": "You can only update your own password."}));
    }
}
