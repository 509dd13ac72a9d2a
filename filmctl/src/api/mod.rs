//! REST API: route handlers and their request/response types.
//!
//! - **Auth** (`/signup`, `/signin`, `/signout`): accounts and bearer tokens
//! - **Films** (`/films/*`): public catalog reads, admin-only writes
//! - **Critics** (`/critics/*`): one review per user and film
//! - **Users** (`/users/{id}`): self-service profile and password change
//! - **Reference data** (`/actors/*`, `/languages/*`): read only
//!
//! Every handler carries a `utoipa` annotation; the generated document is served at
//! `/api-docs/openapi.json` and browsable at `/docs`.

pub mod handlers;
pub mod models;
