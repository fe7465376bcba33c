//! SessionStatus enum for tracking a bracket run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StateMachine, ValidationError};

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Ongoing,
    Finished,
}

impl SessionStatus {
    /// Returns true while rounds may still be played.
    pub fn is_ongoing(&self) -> bool {
        matches!(self, SessionStatus::Ongoing)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Ongoing => "ONGOING",
            SessionStatus::Finished => "FINISHED",
        }
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (SessionStatus::Ongoing, SessionStatus::Finished))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            SessionStatus::Ongoing => vec![SessionStatus::Finished],
            SessionStatus::Finished => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONGOING" => Ok(SessionStatus::Ongoing),
            "FINISHED" => Ok(SessionStatus::Finished),
            other => Err(ValidationError::invalid_format(
                "session_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
