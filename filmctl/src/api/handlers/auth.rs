use axum::{Json, extract::State, http::StatusCode};
use sqlx::SqliteConnection;

use crate::{
    AppState,
    api::models::{
        auth::{LoginRequest, RegisterRequest, TokenResponse},
        responses::MessageDataResponse,
        users::{CurrentUser, UserResponse},
    },
    auth::session::{self, ALREADY_LOGGED_IN},
    db::handlers::Users,
    errors::Error,
    validation::{Payload, Validator},
};

/// Longest login, email or name accepted at sign up
const MAX_FIELD_LENGTH: usize = 255;

/// Run the sign up rules, including the uniqueness lookups.
async fn validate_registration(
    conn: &mut SqliteConnection,
    payload: &Payload,
    min_password: usize,
    max_password: usize,
) -> Result<RegisterRequest, Error> {
    let mut v = Validator::new(payload);

    let login = v.string("login");
    let login = v.required("login", login);
    v.max_chars("login", login.as_deref(), MAX_FIELD_LENGTH);

    let password = v.string("password");
    let password = v.required("password", password);
    v.min_chars("password", password.as_deref(), min_password);
    v.max_chars("password", password.as_deref(), max_password);

    let email = v.string("email");
    let email = v.required("email", email);
    v.max_chars("email", email.as_deref(), MAX_FIELD_LENGTH);
    v.email("email", email.as_deref());

    let first_name = v.string("first_name");
    let first_name = v.required("first_name", first_name);
    v.max_chars("first_name", first_name.as_deref(), MAX_FIELD_LENGTH);

    let last_name = v.string("last_name");
    let last_name = v.required("last_name", last_name);
    v.max_chars("last_name", last_name.as_deref(), MAX_FIELD_LENGTH);

    let mut users = Users::new(conn);
    if let Some(login) = login.as_deref().filter(|_| !v.has_error("login")) {
        if users.get_user_by_login(login).await?.is_some() {
            v.unique_failed("login");
        }
    }
    if let Some(email) = email.as_deref().filter(|_| !v.has_error("email")) {
        if users.get_user_by_email(email).await?.is_some() {
            v.unique_failed("email");
        }
    }

    v.finish(|| {
        Some(RegisterRequest {
            login: login?,
            password: password?,
            email: email?,
            first_name: first_name?,
            last_name: last_name?,
        })
    })
}

/// Create an account
#[utoipa::path(
    post,
    path = "/signup",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 201, description = "User created", body = MessageDataResponse<UserResponse>),
        (status = 403, description = "Caller is already signed in"),
        (status = 422, description = "Invalid input"),
        (status = 429, description = "Too many attempts"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    existing: Option<CurrentUser>,
    payload: Payload,
) -> Result<(StatusCode, Json<MessageDataResponse<UserResponse>>), Error> {
    if existing.is_some() {
        return Err(Error::Conflict {
            message: ALREADY_LOGGED_IN.to_string(),
        });
    }

    let password_rules = &state.config.auth.password;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let request = validate_registration(&mut conn, &payload, password_rules.min_length, password_rules.max_length).await?;
    drop(conn);

    let user = session::register(&state.db, &state.config, request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageDataResponse::new("User created successfully", UserResponse::from(user))),
    ))
}

/// Exchange login and password for a bearer token
#[utoipa::path(
    post,
    path = "/signin",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Authentication failed"),
        (status = 403, description = "User already logged in"),
        (status = 422, description = "Invalid input"),
        (status = 429, description = "Too many attempts"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signin(State(state): State<AppState>, payload: Payload) -> Result<Json<TokenResponse>, Error> {
    let mut v = Validator::new(&payload);
    let login = v.string("login");
    let login = v.required("login", login);
    let password = v.string("password");
    let password = v.required("password", password);
    let request = v.finish(|| {
        Some(LoginRequest {
            login: login?,
            password: password?,
        })
    })?;

    let issued = session::login(&state.db, &state.config, &request.login, request.password).await?;
    Ok(Json(TokenResponse::from(issued)))
}

/// Revoke the presented token
#[utoipa::path(
    post,
    path = "/signout",
    tag = "auth",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn signout(State(state): State<AppState>, current_user: CurrentUser) -> Result<StatusCode, Error> {
    session::logout(&state.db, &current_user).await?;
    Ok(StatusCode::NO_CONTENT)
}
