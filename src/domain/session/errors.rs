//! Bracket-level error taxonomy surfaced by the orchestrator.

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};

/// Errors surfaced by bracket operations.
///
/// Every variant except `ConflictBusy` rolls back the unit of work it
/// occurred in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BracketError {
    /// Session, round or appearance is absent or not owned by the caller.
    NotFound { code: ErrorCode, message: String },
    /// Operation is not valid for the current state.
    InvalidState { code: ErrorCode, message: String },
    /// Another advance is in flight for the same session.
    ConflictBusy(SessionId),
    /// The content generator failed after bounded retries.
    UpstreamGeneratorFailure(String),
    /// Storage failed; the transaction was rolled back.
    PersistenceFailure(String),
}

impl BracketError {
    pub fn session_not_found(id: SessionId) -> Self {
        BracketError::NotFound {
            code: ErrorCode::SessionNotFound,
            message: format!("Session not found: {}", id),
        }
    }
    pub fn invalid_state(code: ErrorCode, message: impl Into<String>) -> Self {
        BracketError::InvalidState {
            code,
            message: message.into(),
        }
    }
    pub fn busy(id: SessionId) -> Self {
        BracketError::ConflictBusy(id)
    }
    pub fn upstream(message: impl Into<String>) -> Self {
        BracketError::UpstreamGeneratorFailure(message.into())
    }
    pub fn persistence(message: impl Into<String>) -> Self {
        BracketError::PersistenceFailure(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            BracketError::NotFound { code, .. } => *code,
            BracketError::InvalidState { code, .. } => *code,
            BracketError::ConflictBusy(_) => ErrorCode::SessionBusy,
            BracketError::UpstreamGeneratorFailure(_) => ErrorCode::GeneratorError,
            BracketError::PersistenceFailure(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn message(&self) -> String {
        match self {
            BracketError::NotFound { message, .. } => message.clone(),
            BracketError::InvalidState { message, .. } => format!("Invalid state: {}", message),
            BracketError::ConflictBusy(id) => {
                format!("Session {} is already being advanced", id)
            }
            BracketError::UpstreamGeneratorFailure(msg) => {
                format!("Content generator failed: {}", msg)
            }
            BracketError::PersistenceFailure(msg) => format!("Persistence failure: {}", msg),
        }
    }
}

impl std::fmt::Display for BracketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BracketError {}

impl From<DomainError> for BracketError {
    fn from(err: DomainError) -> Self {
        match err.code {
            code if code.is_not_found() => BracketError::NotFound {
                code,
                message: err.message,
            },
            ErrorCode::SessionBusy => match err
                .details
                .get("session_id")
                .and_then(|id| id.parse::<SessionId>().ok())
            {
                Some(id) => BracketError::ConflictBusy(id),
                None => BracketError::InvalidState {
                    code: ErrorCode::SessionBusy,
                    message: err.message,
                },
            },
            ErrorCode::GeneratorError => BracketError::UpstreamGeneratorFailure(err.message),
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                BracketError::PersistenceFailure(err.message)
            }
            code => BracketError::InvalidState {
                code,
                message: err.message,
            },
        }
    }
}
