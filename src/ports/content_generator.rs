//! Content generator port - natural-language text for comparisons and reports.
//!
//! Implementations are side-effect free: a failed or repeated call leaves
//! nothing behind, so callers may retry freely.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::SessionId;
use crate::domain::session::{BaseInformation, BracketError, Category, Report, FINALIST_COUNT};

/// What the generator knows about the person it is writing for.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub session_id: SessionId,
    pub base_information: BaseInformation,
}

impl GenerationContext {
    pub fn new(session_id: SessionId, base_information: BaseInformation) -> Self {
        Self {
            session_id,
            base_information,
        }
    }
}

/// Descriptions for the two sides of a comparison, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedPair {
    pub first: String,
    pub second: String,
}

/// Port for generating comparison and report text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Describe two categories for a pairwise comparison.
    async fn reveal(
        &self,
        context: &GenerationContext,
        first: &Category,
        second: &Category,
    ) -> Result<RevealedPair, GeneratorError>;

    /// Write the final report over three finalists.
    async fn summarize(
        &self,
        context: &GenerationContext,
        finalists: &[Category; FINALIST_COUNT],
    ) -> Result<Report, GeneratorError>;
}

/// Errors from content generation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    /// The call did not finish within its deadline.
    #[error("generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Rate limited by provider.
    #[error("rate limited by provider")]
    RateLimited,

    /// Provider returned a server error.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Completion did not contain the expected JSON.
    #[error("malformed output: {0}")]
    MalformedOutput(String),

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Provider rejected the request itself.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GeneratorError {
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedOutput(message.into())
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GeneratorError::Timeout { .. }
                | GeneratorError::Network(_)
                | GeneratorError::RateLimited
                | GeneratorError::Unavailable(_)
                | GeneratorError::MalformedOutput(_)
        )
    }
}

impl From<GeneratorError> for BracketError {
    fn from(err: GeneratorError) -> Self {
        BracketError::upstream(err.to_string())
    }
}
