//! HTTP request handlers, one module per resource.
//!
//! Handlers extract a [`crate::api::models::users::CurrentUser`] when the route needs a signed-in
//! caller, run payload validation, then the access checks in [`crate::auth::permissions`], and only
//! then touch the store. Every failure is an [`crate::errors::Error`], which renders its own status
//! and JSON body.

pub mod actors;
pub mod auth;
pub mod critics;
pub mod films;
pub mod languages;
pub mod users;
