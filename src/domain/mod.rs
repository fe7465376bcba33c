//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `session` - Session, Round and ChoiceAppearance entities and their invariants
//! - `bracket` - Pure matching engine and finalist selection

pub mod bracket;
pub mod foundation;
pub mod session;
