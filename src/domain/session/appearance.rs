//! ChoiceAppearance entity - one category's slot in a comparison.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AppearanceId, DomainError, ErrorCode, RoundId, SessionId};

use super::Category;

/// Result of a comparison for one appearance.
///
/// Moves from `Undecided` to a decided value exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    #[default]
    Undecided,
    Winner,
    Loser,
}

impl Outcome {
    /// Maps the nullable winner flag used by storage and the wire format.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            None => Outcome::Undecided,
            Some(true) => Outcome::Winner,
            Some(false) => Outcome::Loser,
        }
    }

    /// Inverse of [`Outcome::from_flag`].
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Outcome::Undecided => None,
            Outcome::Winner => Some(true),
            Outcome::Loser => Some(false),
        }
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, Outcome::Undecided)
    }
}

/// A category presented in a round, with its generated description.
///
/// # Invariants
///
/// - `appearance_index` is unique within the round and dense from 0
/// - `outcome` is set exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceAppearance {
    id: AppearanceId,
    round_id: RoundId,
    session_id: SessionId,
    category: Category,
    description: String,
    appearance_index: u32,
    outcome: Outcome,
}

impl ChoiceAppearance {
    /// Creates an undecided appearance.
    pub fn new(
        round_id: RoundId,
        session_id: SessionId,
        category: Category,
        description: impl Into<String>,
        appearance_index: u32,
    ) -> Self {
        Self {
            id: AppearanceId::new(),
            round_id,
            session_id,
            category,
            description: description.into(),
            appearance_index,
            outcome: Outcome::Undecided,
        }
    }

    /// Reconstitute an appearance from persistence (no validation).
    pub fn reconstitute(
        id: AppearanceId,
        round_id: RoundId,
        session_id: SessionId,
        category: Category,
        description: String,
        appearance_index: u32,
        outcome: Outcome,
    ) -> Self {
        Self {
            id,
            round_id,
            session_id,
            category,
            description,
            appearance_index,
            outcome,
        }
    }

    pub fn id(&self) -> &AppearanceId {
        &self.id
    }

    pub fn round_id(&self) -> &RoundId {
        &self.round_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn appearance_index(&self) -> u32 {
        self.appearance_index
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_winner(&self) -> bool {
        self.outcome == Outcome::Winner
    }

    /// Records the comparison result.
    ///
    /// # Errors
    ///
    /// - `OutcomeAlreadyDecided` if the outcome was set before
    /// - `ValidationFailed` if `outcome` is `Undecided`
    pub fn decide(&mut self, outcome: Outcome) -> Result<(), DomainError> {
        if !outcome.is_decided() {
            return Err(DomainError::validation(
                "outcome",
                "An outcome must be a winner or a loser",
            ));
        }
        if self.outcome.is_decided() {
            return Err(DomainError::new(
                ErrorCode::OutcomeAlreadyDecided,
                format!("Outcome already decided for appearance {}", self.id),
            )
            .with_detail("appearance_id", self.id.to_string()));
        }
        self.outcome = outcome;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appearance() -> ChoiceAppearance {
        ChoiceAppearance::new(
            RoundId::new(),
            SessionId::new(),
            Category::new("医学").unwrap(),
            "text",
            0,
        )
    }

    #[test]
    fn new_appearance_is_undecided() {
        let a = appearance();
        assert_eq!(a.outcome(), Outcome::Undecided);
        assert!(!a.is_winner());
    }

    #[test]
    fn decide_sets_outcome_once() {
        let mut a = appearance();
        a.decide(Outcome::Winner).unwrap();
        assert!(a.is_winner());

        let err = a.decide(Outcome::Loser).unwrap_err();
        assert_eq!(err.code, ErrorCode::OutcomeAlreadyDecided);
        assert!(a.is_winner());
    }

    #[test]
    fn decide_rejects_undecided() {
        let mut a = appearance();
        let err = a.decide(Outcome::Undecided).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn outcome_maps_to_nullable_flag() {
        for outcome in [Outcome::Undecided, Outcome::Winner, Outcome::Loser] {
            assert_eq!(Outcome::from_flag(outcome.as_flag()), outcome);
        }
        assert_eq!(Outcome::Winner.as_flag(), Some(true));
    }
}
