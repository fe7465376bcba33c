//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, lifecycle enums, and error types that form
//! the vocabulary of the bracket domain.

mod auth;
mod errors;
mod ids;
mod ownership;
mod round_status;
mod session_status;
mod state_machine;
mod timestamp;

pub use auth::AuthenticatedUser;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AppearanceId, RoundId, SessionId, UserId};
pub use ownership::OwnedByUser;
pub use round_status::RoundStatus;
pub use session_status::SessionStatus;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
