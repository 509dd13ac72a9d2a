//! API request and response data models.
//!
//! These types define the public JSON contract and are kept apart from the row types in
//! [`crate::db::models`], so storage and wire shapes can change independently. Request types are
//! what a validated payload turns into; response types never carry secrets such as password
//! hashes.
//!
//! - [`auth`]: sign up / sign in payloads and the issued token
//! - [`users`]: roles, the public user shape and the request principal
//! - [`films`], [`critics`], [`actors`], [`languages`]: catalog resources
//! - [`pagination`]: `skip`/`limit` parameters and the paginated envelope
//! - [`responses`]: `{data}`, `{message}` and `{message, data}` envelopes

pub mod actors;
pub mod auth;
pub mod critics;
pub mod films;
pub mod languages;
pub mod pagination;
pub mod responses;
pub mod users;
