//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Writes and reads alike run inside a [`UnitOfWork`]; writes on one session
//! are serialized through [`SessionLocks`].

pub mod handlers;
mod resilient_generator;
mod session_locks;
mod unit_of_work;

pub use handlers::bracket::{
    AdvanceSessionCommand, AdvanceSessionHandler, Comparison, ComparisonOutcome,
    CreateSessionCommand, CreateSessionHandler, CreateSessionResult, GenerateReportCommand,
    GenerateReportHandler, GetSessionHandler, GetSessionQuery, ListSessionsHandler,
    ListSessionsQuery, NextAction,
};
pub use resilient_generator::{ResilientGenerator, RetryPolicy};
pub use session_locks::{SessionLockGuard, SessionLocks};
pub use unit_of_work::UnitOfWork;
