//! Database record models matching table schemas.
//!
//! These structs are what repositories accept and return. They are kept separate from the API
//! models in [`crate::api::models`] so storage and wire representations can evolve independently;
//! in particular `UserDBResponse` carries the password hash, which no API type does.
//!
//! Each entity has up to three shapes:
//!
//! - `*CreateDBRequest`: everything needed for an insert
//! - `*UpdateDBRequest`: optional fields for partial updates
//! - `*DBResponse`: a full row as returned by queries

pub mod actors;
pub mod critics;
pub mod films;
pub mod languages;
pub mod session_tokens;
pub mod users;
