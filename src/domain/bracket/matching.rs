//! Matching engine - pure decisions over a round's appearances.
//!
//! Nothing here touches storage or the generator; the orchestrator feeds in
//! the current round and persists whatever it decides.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::session::{Category, Outcome, Round};
use crate::ports::CategoryExpansions;

/// Winners of a closed round and the categories of the round after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    /// Decided winners in appearance order, then the implicit bye (if any).
    pub winners: Vec<Category>,
    /// Empty when the bracket is over.
    pub next_round: Vec<Category>,
}

impl RoundResult {
    /// The category the session ends on, when the bracket is over.
    pub fn final_category(&self) -> Option<&Category> {
        if self.next_round.is_empty() {
            self.winners.first()
        } else {
            None
        }
    }
}

/// Eligible categories with no decided appearance, in eligible order.
///
/// A category whose appearance is still undecided counts as remaining.
pub fn remaining(round: &Round) -> Vec<Category> {
    round
        .eligible()
        .iter()
        .filter(|category| {
            !round
                .appearances()
                .iter()
                .any(|a| a.category() == *category && a.outcome().is_decided())
        })
        .cloned()
        .collect()
}

/// Computes the winners of a round and the categories of the next one.
///
/// - one winner with an expansion: next round is the expansion (drill-down)
/// - one winner without an expansion: next round is empty (terminal)
/// - several winners: they form the next round
///
/// # Errors
///
/// - `InconsistentRound` if any appearance is undecided, if more than one
///   category never appeared, or if nothing won
pub fn winners_and_next(
    round: &Round,
    expansions: &dyn CategoryExpansions,
) -> Result<RoundResult, DomainError> {
    if round.has_undecided() {
        return Err(inconsistent(round, "appearances are still undecided"));
    }

    let mut winners: Vec<Category> = round
        .appearances()
        .iter()
        .filter(|a| a.outcome() == Outcome::Winner)
        .map(|a| a.category().clone())
        .collect();

    let unappeared: Vec<&Category> = round
        .eligible()
        .iter()
        .filter(|c| !round.has_appeared(c))
        .collect();
    if unappeared.len() > 1 {
        return Err(inconsistent(
            round,
            &format!("{} categories never appeared", unappeared.len()),
        ));
    }
    winners.extend(unappeared.into_iter().cloned());

    let next_round = match winners.as_slice() {
        [] => return Err(inconsistent(round, "no category won")),
        [sole] => expansions.expansion_of(sole),
        several => several.to_vec(),
    };

    Ok(RoundResult {
        winners,
        next_round,
    })
}

/// Picks two distinct categories uniformly at random.
///
/// # Errors
///
/// - `InconsistentRound` if fewer than two categories are given
pub fn sample_pair<R: Rng + ?Sized>(
    candidates: &[Category],
    rng: &mut R,
) -> Result<(Category, Category), DomainError> {
    match candidates.choose_multiple(rng, 2).collect::<Vec<_>>().as_slice() {
        [first, second] => Ok(((*first).clone(), (*second).clone())),
        _ => Err(DomainError::new(
            ErrorCode::InconsistentRound,
            format!("Cannot sample a pair from {} categories", candidates.len()),
        )),
    }
}

fn inconsistent(round: &Round, reason: &str) -> DomainError {
    DomainError::new(
        ErrorCode::InconsistentRound,
        format!("Round {} is inconsistent: {}", round.round_number(), reason),
    )
    .with_detail("round_id", round.id().to_string())
}
