//! Business operations for users and posts.
//!
//! Consumers of this crate (the `web` layer) never depend on `entity_api`
//! directly; the entity models are re-exported here.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{posts, users, Id};

pub mod error;
pub mod jwt;
pub mod post;
pub mod user;
