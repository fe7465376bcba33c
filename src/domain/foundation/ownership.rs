//! Ownership trait for user-owned resources.
//!
//! Ownership failures are reported as "not found" so that a caller who does
//! not own a session cannot learn that it exists.

use super::{DomainError, ErrorCode, UserId};

/// Trait for aggregates that have a single owner.
pub trait OwnedByUser {
    /// Returns the ID of the user who owns this resource.
    fn owner_id(&self) -> &UserId;

    /// Human-readable identifier used in the not-found message.
    fn resource_label(&self) -> String;

    /// Checks if the given user is the owner.
    fn is_owner(&self, user_id: &UserId) -> bool {
        self.owner_id() == user_id
    }

    /// Validates ownership.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if `user_id` is not the owner
    fn check_ownership(&self, user_id: &UserId) -> Result<(), DomainError> {
        if self.is_owner(user_id) {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", self.resource_label()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owned {
        owner: UserId,
    }

    impl OwnedByUser for Owned {
        fn owner_id(&self) -> &UserId {
            &self.owner
        }

        fn resource_label(&self) -> String {
            "owned-thing".to_string()
        }
    }

    #[test]
    fn owner_passes_check() {
        let owned = Owned {
            owner: UserId::new("alice").unwrap(),
        };
        assert!(owned.check_ownership(&UserId::new("alice").unwrap()).is_ok());
    }

    #[test]
    fn non_owner_sees_not_found() {
        let owned = Owned {
            owner: UserId::new("alice").unwrap(),
        };
        let err = owned
            .check_ownership(&UserId::new("mallory").unwrap())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }
}
