//! Typed inputs for endpoints whose bodies or query strings are not a plain
//! entity model.

pub(crate) mod post;
pub(crate) mod user;
