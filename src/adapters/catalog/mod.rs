//! Category catalog adapters.

mod static_expansions;

pub use static_expansions::{ExpansionTableError, StaticCategoryExpansions};
