use crate::AppState;
use crate::db::errors::DbError;
use crate::validation::ValidationErrors;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Missing, malformed, unknown or expired bearer token
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated principal is not allowed to act on the target
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Request conflicts with the principal's current session state
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Field-level input errors
    #[error("Validation failed: {}", .errors.summary())]
    Validation { errors: ValidationErrors },

    /// Request could not be interpreted at all
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{message}")]
    NotFound { message: String },

    /// Rate limit window exhausted for this client
    #[error("Too many requests, retry after {}s", .retry_after.as_secs())]
    TooManyRequests { retry_after: Duration },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            // Session-singleton conflicts are reported as 403, like ownership failures
            Error::Forbidden { .. } | Error::Conflict { .. } => StatusCode::FORBIDDEN,
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                DbError::ForeignKeyViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                DbError::CheckViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Unauthenticated.".to_string()),
            Error::Forbidden { message } | Error::Conflict { message } => message.clone(),
            Error::Validation { errors } => errors.summary(),
            Error::BadRequest { message } | Error::NotFound { message } => message.clone(),
            Error::TooManyRequests { .. } => "Too Many Attempts.".to_string(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => {
                    self.field_errors().map(|e| e.summary()).unwrap_or_default()
                }
                DbError::Other(_) => "Internal server error".to_string(),
            },
        }
    }

    /// Field errors carried by the response, including constraint violations the store caught
    fn field_errors(&self) -> Option<ValidationErrors> {
        match self {
            Error::Validation { errors } => Some(errors.clone()),
            Error::Database(DbError::UniqueViolation { column, .. }) => {
                let field = column.clone().unwrap_or_else(|| "resource".to_string());
                Some(ValidationErrors::single(&field, format!("The {} has already been taken.", crate::validation::display_name(&field))))
            }
            Error::Database(DbError::ForeignKeyViolation { .. }) => {
                Some(ValidationErrors::single("resource", "A referenced resource does not exist.".to_string()))
            }
            Error::Database(DbError::CheckViolation { .. }) => {
                Some(ValidationErrors::single("resource", "The given data was invalid.".to_string()))
            }
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_))
    }
}

/// Internal error chain, attached to 500 responses as an extension.
///
/// Never serialized by itself; [`expose_internal_detail`] copies it into the body when `debug` is on.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            e if e.is_internal() => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Conflict { .. } | Error::TooManyRequests { .. } => {
                tracing::warn!("Request rejected: {}", self);
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let mut body = json!({ "message": self.user_message() });
        if let Some(errors) = self.field_errors() {
            body["errors"] = json!(errors);
        }

        let mut response = (status, axum::Json(body)).into_response();
        if let Error::TooManyRequests { retry_after } = &self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        if self.is_internal() {
            response.extensions_mut().insert(InternalDetail(format!("{:#}", self)));
        }
        response
    }
}

/// Response layer that adds `detail` to internal error bodies when `config.debug` is set.
pub async fn expose_internal_detail(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let Some(InternalDetail(detail)) = response.extensions_mut().remove::<InternalDetail>() else {
        return response;
    };
    if !state.config.debug {
        return response;
    }

    let body = json!({ "message": "Internal server error", "detail": detail });
    (response.status(), axum::Json(body)).into_response()
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation { errors }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
