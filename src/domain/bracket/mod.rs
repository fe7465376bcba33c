//! Bracket module - pure elimination logic.
//!
//! - `matching` - remaining categories, winners, byes and the next round
//! - `history` - finalist selection for the report
//!
//! Stateless functions over session entities; persistence and content
//! generation stay with the orchestrator.

mod history;
mod matching;

pub use history::finalists;
pub use matching::{remaining, sample_pair, winners_and_next, RoundResult};
