//! Finalist selection from a session's round history.

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::session::{Category, Round, FINALIST_COUNT};

/// The most recently decided distinct winners, newest first.
///
/// Rounds are walked from the latest back; within a round, winners are taken
/// in appearance order. Stops once three are found.
///
/// # Errors
///
/// - `NotEnoughWinners` if fewer than three distinct winners exist
pub fn finalists(rounds: &[Round]) -> Result<[Category; FINALIST_COUNT], DomainError> {
    let mut found: Vec<Category> = Vec::with_capacity(FINALIST_COUNT);

    'rounds: for round in rounds.iter().rev() {
        for appearance in round.appearances() {
            if !appearance.is_winner() || found.contains(appearance.category()) {
                continue;
            }
            found.push(appearance.category().clone());
            if found.len() == FINALIST_COUNT {
                break 'rounds;
            }
        }
    }

    let count = found.len();
    <[Category; FINALIST_COUNT]>::try_from(found).map_err(|_| {
        DomainError::new(
            ErrorCode::NotEnoughWinners,
            format!(
                "A report needs {} distinct winners, only {} decided",
                FINALIST_COUNT, count
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::domain::session::Outcome;

    fn cat(name: &str) -> Category {
        Category::new(name).unwrap()
    }

    /// Builds a round whose appearances are `(name, won)` in order.
    fn round(number: u32, appearances: &[(&str, bool)]) -> Round {
        let eligible = appearances.iter().map(|(n, _)| cat(n)).collect();
        let mut r = Round::new(SessionId::new(), number, eligible).unwrap();
        for (name, won) in appearances {
            let id = *r.add_appearance(cat(name), "").unwrap().id();
            let outcome = if *won { Outcome::Winner } else { Outcome::Loser };
            r.appearance_mut(&id).unwrap().decide(outcome).unwrap();
        }
        r.complete().unwrap();
        r
    }

    #[test]
    fn latest_rounds_come_first() {
        let rounds = vec![
            round(1, &[("a", true), ("b", false), ("c", true), ("d", false)]),
            round(2, &[("a", false), ("c", true)]),
            round(3, &[("x", true), ("y", false)]),
        ];

        let picked = finalists(&rounds).unwrap();
        assert_eq!(picked, [cat("x"), cat("c"), cat("a")]);
    }

    #[test]
    fn repeated_winners_are_counted_once() {
        let rounds = vec![
            round(
                1,
                &[
                    ("a", true),
                    ("b", false),
                    ("c", true),
                    ("d", false),
                    ("e", true),
                    ("f", false),
                ],
            ),
            round(2, &[("a", true), ("c", false)]),
        ];

        let picked = finalists(&rounds).unwrap();
        assert_eq!(picked, [cat("a"), cat("c"), cat("e")]);
    }

    #[test]
    fn appearance_order_breaks_ties_within_a_round() {
        let rounds = vec![round(
            1,
            &[("q", false), ("p", true), ("s", true), ("r", false), ("t", true), ("u", false)],
        )];

        let picked = finalists(&rounds).unwrap();
        assert_eq!(picked, [cat("p"), cat("s"), cat("t")]);
    }

    #[test]
    fn two_winners_are_not_enough() {
        let rounds = vec![round(1, &[("a", true), ("b", false), ("c", true), ("d", false)])];

        let err = finalists(&rounds).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotEnoughWinners);
    }

    #[test]
    fn no_rounds_is_not_enough() {
        let err = finalists(&[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotEnoughWinners);
    }
}
