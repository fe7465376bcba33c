//! Store gateway port - narrow row operations over the session tree.
//!
//! A gateway is always borrowed from an open transaction; nothing it does is
//! visible to other transactions until the owning unit of work commits.
//!
//! # Design
//!
//! - **Row-level**: one call per insert or state change, no aggregate diffing
//! - **Transaction-bound**: `&mut self` on every call, never shared
//! - **No commit**: committing and rolling back belong to the unit of work

use crate::domain::foundation::{
    AppearanceId, DomainError, RoundId, RoundStatus, SessionId, UserId,
};
use crate::domain::session::{ChoiceAppearance, Outcome, Round, Session};
use async_trait::async_trait;

/// Gateway over sessions, rounds and appearances.
#[async_trait]
pub trait StoreGateway: Send {
    /// Insert a new session row (rounds are inserted separately).
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn insert_session(&mut self, session: &Session) -> Result<(), DomainError>;

    /// Load a session with its rounds and appearances.
    ///
    /// Returns `None` if not found.
    async fn load_session(&mut self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Load a session for modification, locking its row until the
    /// transaction ends where the backend supports it.
    async fn load_session_for_update(
        &mut self,
        id: &SessionId,
    ) -> Result<Option<Session>, DomainError>;

    /// IDs of the sessions owned by `user_id`, newest first.
    async fn list_session_ids(&mut self, user_id: &UserId) -> Result<Vec<SessionId>, DomainError>;

    /// Persist status, round number, final category and report.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    async fn update_session(&mut self, session: &Session) -> Result<(), DomainError>;

    /// Insert a new round row (appearances are inserted separately).
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the session already has an active round
    ///   or the round number is taken
    async fn insert_round(&mut self, round: &Round) -> Result<(), DomainError>;

    /// Move a round to `status`.
    ///
    /// # Errors
    ///
    /// - `RoundNotFound` if the round doesn't exist
    async fn update_round_status(
        &mut self,
        id: &RoundId,
        status: RoundStatus,
    ) -> Result<(), DomainError>;

    /// Insert appearances, all belonging to one round.
    ///
    /// # Errors
    ///
    /// - `InconsistentRound` if an index or category is already taken
    async fn insert_appearances(
        &mut self,
        appearances: &[ChoiceAppearance],
    ) -> Result<(), DomainError>;

    /// Record the outcome of an undecided appearance.
    ///
    /// # Errors
    ///
    /// - `AppearanceNotFound` if the appearance doesn't exist
    /// - `OutcomeAlreadyDecided` if it already has an outcome
    async fn record_outcome(
        &mut self,
        id: &AppearanceId,
        outcome: Outcome,
    ) -> Result<(), DomainError>;
}
