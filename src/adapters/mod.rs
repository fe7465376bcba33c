//! Adapters - Implementations of port interfaces.
//!
//! - `catalog` - category expansion table loaded from YAML
//! - `generator` - content generators (OpenAI-compatible, mock)
//! - `http` - axum REST API
//! - `memory` - in-memory transactional store
//! - `postgres` - PostgreSQL transactional store

pub mod catalog;
pub mod generator;
pub mod http;
pub mod memory;
pub mod postgres;

pub use catalog::StaticCategoryExpansions;
pub use generator::{MockContentGenerator, OpenAIGenerator, OpenAIGeneratorConfig};
pub use memory::InMemoryStore;
pub use postgres::{PostgresTransactionManager, run_migrations};
