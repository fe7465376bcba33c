//! Round entity - one pass of pairwise comparisons over a fixed category list.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AppearanceId, DomainError, ErrorCode, RoundId, RoundStatus, SessionId, StateMachine,
};

use super::{Category, ChoiceAppearance};

/// A round needs at least this many eligible categories.
pub const MIN_ELIGIBLE_CATEGORIES: usize = 2;

/// One elimination round.
///
/// # Invariants
///
/// - `eligible` holds at least two distinct categories, fixed at creation
/// - appearances are ordered by `appearance_index`, dense from 0
/// - a category appears at most once
/// - `Active -> Completed` happens exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    id: RoundId,
    session_id: SessionId,
    round_number: u32,
    status: RoundStatus,
    eligible: Vec<Category>,
    appearances: Vec<ChoiceAppearance>,
}

impl Round {
    /// Creates an active round with no appearances.
    ///
    /// # Errors
    ///
    /// - `InconsistentRound` with fewer than two or duplicate categories
    pub fn new(
        session_id: SessionId,
        round_number: u32,
        eligible: Vec<Category>,
    ) -> Result<Self, DomainError> {
        if eligible.len() < MIN_ELIGIBLE_CATEGORIES {
            return Err(DomainError::new(
                ErrorCode::InconsistentRound,
                format!(
                    "A round needs at least {} categories, got {}",
                    MIN_ELIGIBLE_CATEGORIES,
                    eligible.len()
                ),
            ));
        }
        for (i, category) in eligible.iter().enumerate() {
            if eligible[..i].contains(category) {
                return Err(DomainError::new(
                    ErrorCode::InconsistentRound,
                    format!("Category '{}' listed twice in round", category),
                ));
            }
        }

        Ok(Self {
            id: RoundId::new(),
            session_id,
            round_number,
            status: RoundStatus::Active,
            eligible,
            appearances: Vec::new(),
        })
    }

    /// Reconstitute a round from persistence (no validation).
    ///
    /// Appearances are sorted by index.
    pub fn reconstitute(
        id: RoundId,
        session_id: SessionId,
        round_number: u32,
        status: RoundStatus,
        eligible: Vec<Category>,
        mut appearances: Vec<ChoiceAppearance>,
    ) -> Self {
        appearances.sort_by_key(|a| a.appearance_index());
        Self {
            id,
            session_id,
            round_number,
            status,
            eligible,
            appearances,
        }
    }

    pub fn id(&self) -> &RoundId {
        &self.id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Categories eligible in this round, in creation order.
    pub fn eligible(&self) -> &[Category] {
        &self.eligible
    }

    /// Appearances in index order.
    pub fn appearances(&self) -> &[ChoiceAppearance] {
        &self.appearances
    }

    pub fn appearance(&self, id: &AppearanceId) -> Option<&ChoiceAppearance> {
        self.appearances.iter().find(|a| a.id() == id)
    }

    pub fn appearance_mut(&mut self, id: &AppearanceId) -> Option<&mut ChoiceAppearance> {
        self.appearances.iter_mut().find(|a| a.id() == id)
    }

    /// Index the next appearance must take.
    pub fn next_appearance_index(&self) -> u32 {
        self.appearances.len() as u32
    }

    pub fn has_appeared(&self, category: &Category) -> bool {
        self.appearances.iter().any(|a| a.category() == category)
    }

    /// True while some appearance still awaits its outcome.
    pub fn has_undecided(&self) -> bool {
        self.appearances.iter().any(|a| !a.outcome().is_decided())
    }

    /// Creates the next appearance for `category` and returns a reference to it.
    ///
    /// # Errors
    ///
    /// - `RoundCompleted` if the round is closed
    /// - `InconsistentRound` if the category is not eligible or already appeared
    pub fn add_appearance(
        &mut self,
        category: Category,
        description: impl Into<String>,
    ) -> Result<&ChoiceAppearance, DomainError> {
        self.ensure_active()?;
        if !self.eligible.contains(&category) {
            return Err(DomainError::new(
                ErrorCode::InconsistentRound,
                format!("Category '{}' is not eligible in round {}", category, self.round_number),
            ));
        }
        if self.has_appeared(&category) {
            return Err(DomainError::new(
                ErrorCode::InconsistentRound,
                format!("Category '{}' already appeared in round {}", category, self.round_number),
            ));
        }

        let appearance = ChoiceAppearance::new(
            self.id,
            self.session_id,
            category,
            description,
            self.next_appearance_index(),
        );
        self.appearances.push(appearance);
        Ok(&self.appearances[self.appearances.len() - 1])
    }

    /// Closes the round.
    ///
    /// # Errors
    ///
    /// - `RoundCompleted` if already completed
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.status = self
            .status
            .transition_to(RoundStatus::Completed)
            .map_err(DomainError::from)?;
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::RoundCompleted,
                format!("Round {} is already completed", self.round_number),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::Outcome;

    fn categories(names: &[&str]) -> Vec<Category> {
        names.iter().map(|n| Category::new(*n).unwrap()).collect()
    }

    fn round(names: &[&str]) -> Round {
        Round::new(SessionId::new(), 1, categories(names)).unwrap()
    }

    #[test]
    fn new_round_is_active_and_empty() {
        let r = round(&["a", "b"]);
        assert!(r.is_active());
        assert!(r.appearances().is_empty());
        assert_eq!(r.next_appearance_index(), 0);
    }

    #[test]
    fn new_round_rejects_single_category() {
        let err = Round::new(SessionId::new(), 1, categories(&["a"])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentRound);
    }

    #[test]
    fn new_round_rejects_duplicate_categories() {
        let err = Round::new(SessionId::new(), 1, categories(&["a", "b", "a"])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentRound);
    }

    #[test]
    fn appearances_get_dense_indices() {
        let mut r = round(&["a", "b", "c"]);
        r.add_appearance(Category::new("b").unwrap(), "x").unwrap();
        r.add_appearance(Category::new("a").unwrap(), "y").unwrap();

        let indices: Vec<u32> = r.appearances().iter().map(|a| a.appearance_index()).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(r.next_appearance_index(), 2);
    }

    #[test]
    fn category_appears_at_most_once() {
        let mut r = round(&["a", "b"]);
        r.add_appearance(Category::new("a").unwrap(), "x").unwrap();
        let err = r.add_appearance(Category::new("a").unwrap(), "x").unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentRound);
    }

    #[test]
    fn ineligible_category_is_rejected() {
        let mut r = round(&["a", "b"]);
        let err = r.add_appearance(Category::new("z").unwrap(), "x").unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentRound);
    }

    #[test]
    fn complete_happens_once() {
        let mut r = round(&["a", "b"]);
        r.complete().unwrap();
        assert_eq!(r.status(), RoundStatus::Completed);

        let err = r.complete().unwrap_err();
        assert_eq!(err.code, ErrorCode::RoundCompleted);
    }

    #[test]
    fn completed_round_rejects_appearances() {
        let mut r = round(&["a", "b"]);
        r.complete().unwrap();
        let err = r.add_appearance(Category::new("a").unwrap(), "x").unwrap_err();
        assert_eq!(err.code, ErrorCode::RoundCompleted);
    }

    #[test]
    fn undecided_tracking_follows_outcomes() {
        let mut r = round(&["a", "b"]);
        let id = *r.add_appearance(Category::new("a").unwrap(), "x").unwrap().id();
        assert!(r.has_undecided());

        r.appearance_mut(&id).unwrap().decide(Outcome::Winner).unwrap();
        assert!(!r.has_undecided());
    }

    #[test]
    fn reconstitute_sorts_appearances_by_index() {
        let session_id = SessionId::new();
        let round_id = RoundId::new();
        let later = ChoiceAppearance::new(round_id, session_id, Category::new("b").unwrap(), "", 1);
        let earlier = ChoiceAppearance::new(round_id, session_id, Category::new("a").unwrap(), "", 0);

        let r = Round::reconstitute(
            round_id,
            session_id,
            1,
            RoundStatus::Active,
            categories(&["a", "b"]),
            vec![later, earlier],
        );

        assert_eq!(r.appearances()[0].category().as_str(), "a");
    }
}
