//! Fixtures shared by unit and end-to-end tests.

use std::sync::atomic::{AtomicU64, Ordering};

use axum_test::TestServer;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::{
    api::models::{
        actors::ActorResponse,
        films::FilmResponse,
        users::{Role, UserResponse},
    },
    auth::{
        password::{self, Argon2Params},
        session::hash_token,
    },
    config::Config,
    db::{
        handlers::{Actors, Critics, Films, Repository, SessionTokens, Users},
        models::{
            actors::ActorCreateDBRequest, critics::CriticCreateDBRequest, films::FilmCreateDBRequest,
            session_tokens::SessionTokenCreateDBRequest, users::UserCreateDBRequest,
        },
    },
    types::{ActorId, CriticId, FilmId, UserId},
};

/// Password of every user made by [`create_test_user`]
pub const TEST_PASSWORD: &str = "test-password";

static NEXT_USER: AtomicU64 = AtomicU64::new(1);

/// Default config with Argon2 cheap enough for tests.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config.auth.password.argon2_parallelism = 1;
    config
}

pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: SqlitePool, config: Config) -> TestServer {
    crate::Application::new_with_pool(config, pool)
        .expect("Failed to create application")
        .into_test_server()
}

/// A user whose password is [`TEST_PASSWORD`]. Logins are unique within the test process.
pub async fn create_test_user(pool: &SqlitePool, role: Role) -> UserResponse {
    let n = NEXT_USER.fetch_add(1, Ordering::Relaxed);
    let login = format!("testuser_{n}");
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, Argon2Params::from(&create_test_config().auth.password))
        .expect("Failed to hash test password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: format!("{login}@example.com"),
            login,
            password_hash,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
        })
        .await
        .expect("Failed to create test user");

    UserResponse::from(user)
}

/// Issue a bearer token for `user` without going through `/signin`, so tests do not spend the
/// auth-tier rate limit budget.
pub async fn login_as(pool: &SqlitePool, user: &UserResponse) -> String {
    let raw = password::generate_token();
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    SessionTokens::new(&mut conn)
        .create(&SessionTokenCreateDBRequest {
            user_id: user.id,
            token_hash: hash_token(&raw),
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .expect("Failed to create test session");
    raw
}

pub async fn create_test_film(pool: &SqlitePool, title: &str) -> FilmResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let film = Films::new(&mut conn)
        .create(&FilmCreateDBRequest {
            title: title.to_string(),
            release_year: 2006,
            length: 86,
            description: Some("A test film".to_string()),
            rating: Some("PG".to_string()),
            language_id: 1,
            special_features: Some("Trailers".to_string()),
            image: None,
        })
        .await
        .expect("Failed to create test film");

    FilmResponse::from(film)
}

/// An actor born 1970-01-01.
pub async fn create_test_actor(pool: &SqlitePool, first_name: &str, last_name: &str) -> ActorResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let actor = Actors::new(&mut conn)
        .create(&ActorCreateDBRequest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            birthdate: NaiveDate::from_ymd_opt(1970, 1, 1),
        })
        .await
        .expect("Failed to create test actor");

    ActorResponse::from(actor)
}

pub async fn attach_actor_to_film(pool: &SqlitePool, actor_id: ActorId, film_id: FilmId) {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Actors::new(&mut conn)
        .attach_to_film(actor_id, film_id)
        .await
        .expect("Failed to attach actor to film");
}

pub async fn create_test_critic(pool: &SqlitePool, user_id: UserId, film_id: FilmId, score: f64) -> CriticId {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Critics::new(&mut conn)
        .create(&CriticCreateDBRequest {
            user_id,
            film_id,
            score,
            comment: "Test critic".to_string(),
        })
        .await
        .expect("Failed to create test critic")
        .id
}
