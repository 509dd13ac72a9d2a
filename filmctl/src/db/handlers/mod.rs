//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut SqliteConnection`, binds parameters, and maps rows into
//! [`crate::db::models`] records. Tables with a full create/read/update/delete lifecycle implement
//! [`Repository`]; the rest expose only the queries their callers need.
//!
//! - [`Users`]: accounts, looked up by id, login, or email
//! - [`SessionTokens`]: bearer token digests and their expiry
//! - [`Films`]: the catalog, with title search and partial updates
//! - [`Actors`]: people and their film credits
//! - [`Languages`]: seeded reference data
//! - [`Critics`]: user reviews of films

pub mod actors;
pub mod critics;
pub mod films;
pub mod languages;
pub mod repository;
pub mod session_tokens;
pub mod users;

pub use actors::Actors;
pub use critics::Critics;
pub use films::Films;
pub use languages::Languages;
pub use repository::Repository;
pub use session_tokens::SessionTokens;
pub use users::Users;
