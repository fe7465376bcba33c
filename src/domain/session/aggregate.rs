//! Session aggregate - one user's run through the elimination bracket.
//!
//! A session owns its rounds and each round owns its appearances; the whole
//! tree is loaded and persisted together.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AppearanceId, DomainError, ErrorCode, OwnedByUser, SessionId, SessionStatus, StateMachine,
    Timestamp, UserId,
};

use super::{BaseInformation, Category, ChoiceAppearance, Report, Round};

/// Session aggregate.
///
/// # Invariants
///
/// - `Finished` if and only if `final_category` is set
/// - `current_round_number` starts at 1 and never decreases
/// - at most one round is active, and only the latest one
/// - round numbers are strictly increasing
/// - finished sessions only accept a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    user_id: UserId,
    base_information: BaseInformation,
    status: SessionStatus,
    current_round_number: u32,
    final_category: Option<Category>,
    report: Option<Report>,
    rounds: Vec<Round>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Create a new ongoing session at round 1.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if any base information answer is blank
    pub fn new(
        id: SessionId,
        user_id: UserId,
        base_information: BaseInformation,
    ) -> Result<Self, DomainError> {
        base_information.validate()?;

        let now = Timestamp::now();
        Ok(Self {
            id,
            user_id,
            base_information,
            status: SessionStatus::Ongoing,
            current_round_number: 1,
            final_category: None,
            report: None,
            rounds: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        user_id: UserId,
        base_information: BaseInformation,
        status: SessionStatus,
        current_round_number: u32,
        final_category: Option<Category>,
        report: Option<Report>,
        mut rounds: Vec<Round>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        rounds.sort_by_key(|r| r.round_number());
        Self {
            id,
            user_id,
            base_information,
            status,
            current_round_number,
            final_category,
            report,
            rounds,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn base_information(&self) -> &BaseInformation {
        &self.base_information
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        !self.status.is_ongoing()
    }

    pub fn current_round_number(&self) -> u32 {
        self.current_round_number
    }

    pub fn final_category(&self) -> Option<&Category> {
        self.final_category.as_ref()
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Rounds in round-number order.
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// The single active round, if any.
    pub fn active_round(&self) -> Option<&Round> {
        self.rounds.iter().rev().find(|r| r.is_active())
    }

    pub fn active_round_mut(&mut self) -> Option<&mut Round> {
        self.rounds.iter_mut().rev().find(|r| r.is_active())
    }

    /// Looks up an appearance in the active round.
    pub fn active_appearance(&self, id: &AppearanceId) -> Option<&ChoiceAppearance> {
        self.active_round().and_then(|r| r.appearance(id))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Opens the next round over `eligible` and returns it.
    ///
    /// # Errors
    ///
    /// - `SessionFinished` if the session is finished
    /// - `InvalidStateTransition` if a round is still active
    /// - `InconsistentRound` if `eligible` has fewer than two categories
    pub fn start_round(&mut self, eligible: Vec<Category>) -> Result<&mut Round, DomainError> {
        self.ensure_ongoing()?;
        if let Some(active) = self.active_round() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Round {} is still active", active.round_number()),
            ));
        }

        let round_number = self
            .rounds
            .last()
            .map(|r| r.round_number() + 1)
            .unwrap_or(1);
        let round = Round::new(self.id, round_number, eligible)?;

        self.current_round_number = self.current_round_number.max(round_number);
        self.updated_at = Timestamp::now();
        self.rounds.push(round);
        let last = self.rounds.len() - 1;
        Ok(&mut self.rounds[last])
    }

    /// Marks the session finished with its final category.
    ///
    /// # Errors
    ///
    /// - `SessionFinished` if already finished
    /// - `InvalidStateTransition` if a round is still active
    pub fn finish(&mut self, final_category: Category) -> Result<(), DomainError> {
        self.ensure_ongoing()?;
        if let Some(active) = self.active_round() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot finish while round {} is active",
                    active.round_number()
                ),
            ));
        }

        self.status = self
            .status
            .transition_to(SessionStatus::Finished)
            .map_err(DomainError::from)?;
        self.final_category = Some(final_category);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Attaches (or replaces) the report of a finished session.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the session is still ongoing
    pub fn attach_report(&mut self, report: Report) -> Result<(), DomainError> {
        if !self.is_finished() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "A report can only be attached to a finished session",
            ));
        }
        self.report = Some(report);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Validates that the session still accepts bracket progress.
    pub fn ensure_ongoing(&self) -> Result<(), DomainError> {
        if self.status.is_ongoing() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::SessionFinished,
                format!("Session {} is already finished", self.id),
            ))
        }
    }
}

impl OwnedByUser for Session {
    fn owner_id(&self) -> &UserId {
        &self.user_id
    }

    fn resource_label(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RoundStatus;
    use crate::domain::session::base_information::test_support::complete_base_information;

    fn test_user_id() -> UserId {
        UserId::new("user-123").unwrap()
    }

    fn test_session() -> Session {
        Session::new(SessionId::new(), test_user_id(), complete_base_information()).unwrap()
    }

    fn categories(names: &[&str]) -> Vec<Category> {
        names.iter().map(|n| Category::new(*n).unwrap()).collect()
    }

    // Construction tests

    #[test]
    fn new_session_is_ongoing_at_round_one() {
        let session = test_session();
        assert_eq!(session.status(), SessionStatus::Ongoing);
        assert_eq!(session.current_round_number(), 1);
        assert!(session.final_category().is_none());
        assert!(session.rounds().is_empty());
    }

    #[test]
    fn new_session_rejects_incomplete_base_information() {
        let mut info = complete_base_information();
        info.pocket_money_usage.clear();

        let err = Session::new(SessionId::new(), test_user_id(), info).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    // Round tests

    #[test]
    fn start_round_numbers_rounds_from_one() {
        let mut session = test_session();
        let number = session.start_round(categories(&["a", "b"])).unwrap().round_number();
        assert_eq!(number, 1);
        assert_eq!(session.current_round_number(), 1);
    }

    #[test]
    fn only_one_round_may_be_active() {
        let mut session = test_session();
        session.start_round(categories(&["a", "b"])).unwrap();

        let err = session.start_round(categories(&["c", "d"])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        let active = session.rounds().iter().filter(|r| r.is_active()).count();
        assert_eq!(active, 1);
    }

    #[test]
    fn next_round_follows_completed_round() {
        let mut session = test_session();
        session.start_round(categories(&["a", "b"])).unwrap().complete().unwrap();

        let number = session.start_round(categories(&["c", "d"])).unwrap().round_number();
        assert_eq!(number, 2);
        assert_eq!(session.current_round_number(), 2);
        assert_eq!(session.rounds()[0].status(), RoundStatus::Completed);
    }

    // Finish tests

    #[test]
    fn finish_sets_final_category() {
        let mut session = test_session();
        session.finish(Category::new("数学类").unwrap()).unwrap();

        assert!(session.is_finished());
        assert_eq!(session.final_category().unwrap().as_str(), "数学类");
    }

    #[test]
    fn finish_rejects_active_round() {
        let mut session = test_session();
        session.start_round(categories(&["a", "b"])).unwrap();

        let err = session.finish(Category::new("a").unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert!(!session.is_finished());
    }

    #[test]
    fn finished_session_rejects_new_rounds() {
        let mut session = test_session();
        session.finish(Category::new("a").unwrap()).unwrap();

        let err = session.start_round(categories(&["a", "b"])).unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionFinished);
    }

    #[test]
    fn report_requires_finished_session() {
        let mut session = test_session();
        let report = Report {
            final_three_majors: vec![],
            final_three_majors_report: vec![],
            final_recommendation: "x".to_string(),
        };

        assert!(session.attach_report(report.clone()).is_err());
        session.finish(Category::new("a").unwrap()).unwrap();
        assert!(session.attach_report(report).is_ok());
        assert!(session.report().is_some());
    }

    // Ownership tests

    #[test]
    fn non_owner_gets_not_found() {
        let session = test_session();
        let other = UserId::new("someone-else").unwrap();

        let err = session.check_ownership(&other).unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
        assert!(session.check_ownership(&test_user_id()).is_ok());
    }
}
