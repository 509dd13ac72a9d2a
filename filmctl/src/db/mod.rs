//! Database layer for data persistence and access.
//!
//! Data lives in SQLite and is accessed through SQLx. Each table gets a repository in
//! [`handlers`] that borrows a connection (or transaction) and returns records from [`models`].
//!
//! ```text
//! API handlers ──> db::handlers (queries) ──> db::models (records) ──> SQLite
//! ```
//!
//! Writes that span several statements should go through a transaction:
//!
//! ```ignore
//! use filmctl::db::handlers::{Films, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let film = Films::new(&mut tx).create(&request).await?;
//! tx.commit().await?;
//! ```
//!
//! Read-only lookups can use a pooled connection directly. Migrations live in `migrations/` and are
//! exposed through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
