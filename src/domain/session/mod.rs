//! Session domain module.
//!
//! A session is one user's run through the elimination bracket: it owns its
//! rounds, each round owns the appearances presented in it, and a finished
//! session carries its final category and report.

mod aggregate;
mod appearance;
pub(crate) mod base_information;
mod category;
mod errors;
mod report;
mod round;

pub use aggregate::Session;
pub use appearance::{ChoiceAppearance, Outcome};
pub use base_information::{BaseInformation, UNKNOWN_ANSWER};
pub use category::{parse_categories, Category};
pub use errors::BracketError;
pub use report::{Report, FINALIST_COUNT};
pub use round::{Round, MIN_ELIGIBLE_CATEGORIES};
