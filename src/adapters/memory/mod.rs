//! In-memory persistence adapter for tests and local runs.

mod store;
mod tables;

pub use store::{FailPoint, InMemoryStore, InMemoryTransaction};
