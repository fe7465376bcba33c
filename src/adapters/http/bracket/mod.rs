//! HTTP adapter for bracket endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AdvanceSessionRequest, AppearanceResponse, ComparisonResponse, CreateSessionRequest,
    CreateSessionResponse, ErrorResponse, NextActionResponse, OutcomeRequest, ReportResponse,
    RoundResponse, SessionListResponse, SessionResponse,
};
pub use handlers::BracketHandlers;
pub use routes::bracket_routes;
