//! Bracket command and query handlers.

mod advance_session;
mod create_session;
mod generate_report;
mod get_session;
mod list_sessions;
mod report;
mod session_loader;

pub use advance_session::{
    AdvanceSessionCommand, AdvanceSessionHandler, Comparison, ComparisonOutcome, NextAction,
};
pub use create_session::{CreateSessionCommand, CreateSessionHandler, CreateSessionResult};
pub use generate_report::{GenerateReportCommand, GenerateReportHandler};
pub use get_session::{GetSessionHandler, GetSessionQuery};
pub use list_sessions::{ListSessionsHandler, ListSessionsQuery};
