//! HTTP middleware for axum.
//!
//! - `auth` - caller identity middleware and extractors

pub mod auth;

pub use auth::{user_id_middleware, AuthRejection, RequireAuth, USER_ID_HEADER};
