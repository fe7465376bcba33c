//! RoundStatus enum for elimination rounds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StateMachine, ValidationError};

/// Lifecycle status of a round. Completed rounds are never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    #[default]
    Active,
    Completed,
}

impl RoundStatus {
    /// Returns true while comparisons may still be recorded.
    pub fn is_active(&self) -> bool {
        matches!(self, RoundStatus::Active)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Active => "ACTIVE",
            RoundStatus::Completed => "COMPLETED",
        }
    }
}

impl StateMachine for RoundStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (RoundStatus::Active, RoundStatus::Completed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            RoundStatus::Active => vec![RoundStatus::Completed],
            RoundStatus::Completed => vec![],
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoundStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(RoundStatus::Active),
            "COMPLETED" => Ok(RoundStatus::Completed),
            other => Err(ValidationError::invalid_format(
                "round_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_active() {
        assert_eq!(RoundStatus::default(), RoundStatus::Active);
        assert!(RoundStatus::Active.is_active());
    }

    #[test]
    fn storage_form_roundtrips() {
        for status in [RoundStatus::Active, RoundStatus::Completed] {
            assert_eq!(status.as_str().parse::<RoundStatus>().unwrap(), status);
        }
    }
}
