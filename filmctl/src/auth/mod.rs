//! Authentication and authorization.
//!
//! Clients sign in with login and password and receive an opaque bearer token, which they send as
//! `Authorization: Bearer <token>`. The token carries no permissions of its own: every request
//! resolves it to the owning user and reads the role from there.
//!
//! - [`password`]: Argon2id hashing and token generation
//! - [`session`]: registration, login, token resolution and logout
//! - [`current_user`]: extractors that run [`session::authenticate`] for handlers
//! - [`permissions`]: self, admin and one-critic-per-film checks
//!
//! ```ignore
//! async fn handler(user: CurrentUser, State(state): State<AppState>) -> Result<Json<..>, Error> {
//!     permissions::require_admin(&user)?;
//!     ...
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
