//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `StoreGateway` - Row operations over sessions, rounds and appearances
//! - `Transaction` / `TransactionManager` - Atomic scopes the unit of work drives
//!
//! ## Collaborator Ports
//!
//! - `ContentGenerator` - Comparison and report text
//! - `CategoryExpansions` - Drill-down lookup for a lone winner

mod category_expansions;
mod content_generator;
mod store_gateway;
mod unit_of_work;

pub use category_expansions::{CategoryExpansions, NoExpansions};
pub use content_generator::{ContentGenerator, GenerationContext, GeneratorError, RevealedPair};
pub use store_gateway::StoreGateway;
pub use unit_of_work::{Transaction, TransactionManager};
