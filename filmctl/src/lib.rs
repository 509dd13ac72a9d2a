//! # filmctl: film catalog service
//!
//! `filmctl` is a REST backend for a film catalog. It stores films, actors, languages and the
//! critics users write about films, and guards every write behind bearer-token authentication,
//! role checks and per-client rate limits.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); persistence is SQLite through
//! `sqlx`. A request flows through:
//!
//! 1. the **rate limiter** ([`rate_limit`]), for routes that have a tier;
//! 2. the **authenticate** extractor ([`auth::current_user`]), for routes that need a caller;
//! 3. **payload validation** ([`validation`]), collecting every field error into one 422;
//! 4. the **access policy** ([`auth::permissions`]): self, admin, one critic per film;
//! 5. the **repositories** ([`db::handlers`]), which own all SQL.
//!
//! Public catalog reads skip the first two steps.
//!
//! ### Sessions
//!
//! Signing in issues an opaque token; only its SHA-256 digest is stored. A user holds at most one
//! unexpired token at a time, so a second sign in is refused until the first token is revoked or
//! expires. See [`auth::session`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use filmctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = filmctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     filmctl::telemetry::init_telemetry(config.log_format)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod rate_limit;
pub mod telemetry;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::password::{self, Argon2Params},
    config::CorsOrigin,
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    openapi::ApiDoc,
    rate_limit::RateLimiter,
};
use axum::{
    Router,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{FilmId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .rate_limiter(Arc::new(RateLimiter::new(&config.rate_limits)))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// State with a fresh limiter built from `config.rate_limits`.
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limits));
        Self::builder().db(db).config(config).rate_limiter(rate_limiter).build()
    }
}

/// Get the filmctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the configured admin account, or refresh its password and role if it already exists.
///
/// Does nothing when `admin.password` is unset. Safe to run on every start.
#[instrument(skip_all, fields(login = %config.admin.login))]
pub async fn create_initial_admin_user(config: &Config, db: &SqlitePool) -> anyhow::Result<Option<UserId>> {
    let Some(admin_password) = config.admin.password.clone() else {
        debug!("No admin password configured, skipping admin bootstrap");
        return Ok(None);
    };
    let password_hash = password::hash_password(admin_password, Argon2Params::from(&config.auth.password)).await?;

    let mut tx = db.begin().await?;
    let mut users = Users::new(&mut tx);

    let id = match users.get_user_by_login(&config.admin.login).await? {
        Some(existing) => {
            users
                .update(
                    existing.id,
                    &UserUpdateDBRequest {
                        password_hash: Some(password_hash),
                        role: Some(Role::Admin),
                    },
                )
                .await?;
            info!(user_id = existing.id, "Refreshed admin account");
            existing.id
        }
        None => {
            let created = users
                .create(&UserCreateDBRequest {
                    login: config.admin.login.clone(),
                    email: config.admin.email.clone(),
                    password_hash,
                    first_name: "Admin".to_string(),
                    last_name: "Admin".to_string(),
                    role: Role::Admin,
                })
                .await?;
            info!(user_id = created.id, "Created admin account");
            created.id
        }
    };

    tx.commit().await?;
    Ok(Some(id))
}

/// Open the pool and bring the schema up to date.
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = sqlx::sqlite::SqliteConnectOptions::from_str(&config.database.url)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(options)
        .await?;

    migrator().run(&pool).await?;
    create_initial_admin_user(config, &pool).await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.cors;
    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::PATCH, http::Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers([http::header::RETRY_AFTER]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// - public catalog reads, not rate limited
/// - `/signup` and `/signin` behind the auth tier
/// - every route that needs a bearer token behind the standard tier
/// - `/healthz`, the OpenAPI document and its Scalar UI
/// - optional Prometheus metrics, CORS and request tracing
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{actors, auth, critics, films, languages, users};

    let public_routes = Router::new()
        .route("/films", get(films::list_films))
        .route("/films/{id}", get(films::get_film))
        .route("/films/{id}/critics", get(films::list_film_critics))
        .route("/films/{id}/actors", get(films::list_film_actors))
        .route("/critics/{id}", get(critics::get_critic))
        .route("/actors", get(actors::list_actors))
        .route("/actors/{id}", get(actors::get_actor))
        .route("/actors/{id}/films", get(actors::list_actor_films))
        .route("/languages", get(languages::list_languages))
        .route("/languages/{code}", get(languages::get_language));

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::auth_tier));

    let authenticated_routes = Router::new()
        .route("/signout", post(auth::signout))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/password", patch(users::update_password))
        .route("/films", post(films::create_film))
        .route("/films/{id}", put(films::update_film).delete(films::delete_film))
        .route("/critics", post(critics::create_critic))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::standard_tier));

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(from_fn_with_state(state.clone(), errors::expose_internal_detail))
        .with_state(state.clone())
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let mut router = router.layer(create_cors_layer(&state.config)?);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct.
///
/// 1. **Create**: [`Application::new`] opens the database, runs migrations and bootstraps the admin
/// 2. **Serve**: [`Application::serve`] binds to `host:port` and handles requests until shutdown
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting filmctl with configuration: {:#?}", config);
        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool)
    }

    /// Build on an existing, already migrated pool.
    pub fn new_with_pool(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let state = AppState::new(pool.clone(), config.clone());
        let router = build_router(&state)?;
        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("filmctl listening on http://{}, docs at http://localhost:{}/docs", bind_addr, self.config.port);

        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
