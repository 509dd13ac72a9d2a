//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::{SessionTokenId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. Stored and serialized as `ADMIN` / `USER`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub login: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            login: db.login,
            email: db.email,
            first_name: db.first_name,
            last_name: db.last_name,
            role: db.role,
        }
    }
}

/// Principal resolved from a bearer token for the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: UserId,
    pub login: String,
    pub email: String,
    pub role: Role,
    /// The session token this request presented
    pub token_id: SessionTokenId,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Body of `PATCH /users/{id}/password`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PasswordUpdate {
    pub password: String,
    pub password_confirmation: String,
}
