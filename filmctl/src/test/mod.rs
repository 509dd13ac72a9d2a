//! End-to-end tests through the full router: rate limiting, authentication, validation, access
//! policy and the store together.

use crate::api::models::users::Role;
use crate::test_utils::*;
use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::SqlitePool;

/// Sign up, sign in, refused second sign in, sign out, refused second sign out
#[sqlx::test]
#[test_log::test]
async fn test_e2e_session_lifecycle(pool: SqlitePool) {
    let server = create_test_app(pool.clone()).await;

    let signup = server
        .post("/signup")
        .json(&json!({
            "login": "u1",
            "password": "longenough",
            "email": "u1@x.com",
            "first_name": "A",
            "last_name": "B",
        }))
        .await;
    signup.assert_status(StatusCode::CREATED);
    let body: Value = signup.json();
    assert!(body.get("access_token").is_none());
    let user_id = body["data"]["id"].as_i64().unwrap();

    let signin = server
        .post("/signin")
        .json(&json!({"login": "u1", "password": "longenough"}))
        .await;
    signin.assert_status_ok();
    let token = signin.json::<Value>()["access_token"].as_str().unwrap().to_string();

    // The token works on an authenticated route
    let me: Value = server
        .get(&format!("/users/{user_id}"))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(me["data"]["login"], "u1");

    let again = server
        .post("/signin")
        .json(&json!({"login": "u1", "password": "longenough"}))
        .await;
    again.assert_status(StatusCode::FORBIDDEN);
    again.assert_json(&json!({"message": "User already logged in"}));

    server
        .post("/signout")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let repeat = server.post("/signout").authorization_bearer(&token).await;
    repeat.assert_status(StatusCode::UNAUTHORIZED);
    repeat.assert_json(&json!({"message": "Unauthenticated."}));

    // After signing out a fresh sign in is allowed
    server
        .post("/signin")
        .json(&json!({"login": "u1", "password": "longenough"}))
        .await
        .assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_auth_tier_is_shared_by_signup_and_signin(pool: SqlitePool) {
    let server = create_test_app(pool).await;

    for attempt in 0..3 {
        let response = server
            .post("/signin")
            .json(&json!({"login": "ghost", "password": "whatever-password"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.header("x-ratelimit-limit"), "5");
        assert_eq!(response.header("x-ratelimit-remaining"), (4 - attempt).to_string().as_str());
    }
    for _ in 0..2 {
        server.post("/signup").await.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let limited = server.post("/signup").await;
    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
    limited.assert_json(&json!({"message": "Too Many Attempts."}));
    let retry_after: u64 = limited.header("retry-after").to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));

    server
        .post("/signin")
        .json(&json!({"login": "ghost", "password": "whatever-password"}))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    // Public reads are not limited
    server.get("/films").await.assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_standard_tier_gates_authenticated_routes(pool: SqlitePool) {
    let server = create_test_app(pool.clone()).await;
    let user = create_test_user(&pool, Role::User).await;
    let token = login_as(&pool, &user).await;
    let path = format!("/users/{}", user.id);

    for _ in 0..60 {
        server.get(&path).authorization_bearer(&token).await.assert_status_ok();
    }

    let limited = server.get(&path).authorization_bearer(&token).await;
    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);

    // The gate runs before authentication, so a missing token is throttled too
    server.post("/signout").await.assert_status(StatusCode::TOO_MANY_REQUESTS);

    // Other tiers and public routes are unaffected
    server.get("/films").await.assert_status_ok();
    server
        .post("/signin")
        .json(&json!({"login": user.login, "password": TEST_PASSWORD}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_tier_budgets_come_from_config(pool: SqlitePool) {
    let mut config = create_test_config();
    config.rate_limits.standard.max_requests = 2;
    let server = create_test_app_with_config(pool.clone(), config).await;
    let user = create_test_user(&pool, Role::User).await;
    let token = login_as(&pool, &user).await;
    let path = format!("/users/{}", user.id);

    server.get(&path).authorization_bearer(&token).await.assert_status_ok();
    server.get(&path).authorization_bearer(&token).await.assert_status_ok();
    server
        .get(&path)
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

/// Admin curates the catalog, users review it, deleting a film takes its critics along
#[sqlx::test]
#[test_log::test]
async fn test_e2e_catalog_and_critics(pool: SqlitePool) {
    let server = create_test_app(pool.clone()).await;
    let admin = create_test_user(&pool, Role::Admin).await;
    let reviewer = create_test_user(&pool, Role::User).await;

    let admin_token = server
        .post("/signin")
        .json(&json!({"login": admin.login, "password": TEST_PASSWORD}))
        .await
        .json::<Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let reviewer_token = login_as(&pool, &reviewer).await;

    let film_body = json!({
        "title": "Academy Dinosaur",
        "release_year": 2006,
        "length": 86,
        "language_id": 1,
        "special_features": "Deleted Scenes",
    });

    server
        .post("/films")
        .authorization_bearer(&reviewer_token)
        .json(&film_body)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let created = server
        .post("/films")
        .authorization_bearer(&admin_token)
        .json(&film_body)
        .await;
    created.assert_status(StatusCode::CREATED);
    let film_id = created.json::<Value>()["data"]["id"].as_i64().unwrap();

    let listed: Value = server.get("/films").add_query_param("title", "dino").await.json();
    assert_eq!(listed["total_count"], 1);

    let critic = server
        .post("/critics")
        .authorization_bearer(&reviewer_token)
        .json(&json!({"film_id": film_id, "score": 9, "comment": "Roaring"}))
        .await;
    critic.assert_status(StatusCode::CREATED);
    let critic_id = critic.json::<Value>()["data"]["id"].as_i64().unwrap();

    server
        .post("/critics")
        .authorization_bearer(&reviewer_token)
        .json(&json!({"film_id": film_id, "score": 1, "comment": "Changed my mind"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let critics: Value = server.get(&format!("/films/{film_id}/critics")).await.json();
    assert_eq!(critics["data"].as_array().unwrap().len(), 1);

    server
        .delete(&format!("/films/{film_id}"))
        .authorization_bearer(&admin_token)
        .await
        .assert_status_ok();

    server.get(&format!("/critics/{critic_id}")).await.assert_status(StatusCode::NOT_FOUND);
    server.get(&format!("/films/{film_id}")).await.assert_status(StatusCode::NOT_FOUND);
}

#[sqlx::test]
#[test_log::test]
async fn test_e2e_malformed_bodies(pool: SqlitePool) {
    let server = create_test_app(pool).await;

    let array = server.post("/signup").json(&json!(["not", "an", "object"])).await;
    array.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = array.json();
    assert_eq!(body["errors"]["body"][0], "The request body must be a JSON object.");
}
