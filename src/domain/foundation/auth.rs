//! Authentication types for the domain layer.
//!
//! The identity provider sits outside this crate. Whatever verified the
//! caller hands us an opaque user id, which is all the bracket needs.

use super::UserId;

/// Caller identity established by the upstream identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the identity provider.
    pub id: UserId,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(id: UserId) -> Self {
        Self { id }
    }
}
