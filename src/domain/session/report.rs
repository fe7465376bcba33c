//! Final report produced once a session has finished.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

use super::Category;

/// Number of finalists a report covers.
pub const FINALIST_COUNT: usize = 3;

/// Summary of the three most recently decided winners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Finalist names, most recently decided first.
    pub final_three_majors: Vec<String>,
    /// One write-up per finalist, aligned with `final_three_majors`.
    pub final_three_majors_report: Vec<String>,
    /// Overall recommendation.
    pub final_recommendation: String,
}

impl Report {
    /// Checks the report lines up with the finalists it was requested for.
    pub fn validate_against(
        &self,
        finalists: &[Category; FINALIST_COUNT],
    ) -> Result<(), ValidationError> {
        if self.final_three_majors.len() != FINALIST_COUNT {
            return Err(ValidationError::too_few(
                "final_three_majors",
                FINALIST_COUNT,
                self.final_three_majors.len(),
            ));
        }
        if self.final_three_majors_report.len() != FINALIST_COUNT {
            return Err(ValidationError::too_few(
                "final_three_majors_report",
                FINALIST_COUNT,
                self.final_three_majors_report.len(),
            ));
        }
        for finalist in finalists {
            if !self.final_three_majors.iter().any(|m| m.trim() == finalist.as_str()) {
                return Err(ValidationError::invalid_format(
                    "final_three_majors",
                    format!("missing finalist '{}'", finalist),
                ));
            }
        }
        if self.final_recommendation.trim().is_empty() {
            return Err(ValidationError::empty_field("final_recommendation"));
        }
        Ok(())
    }
}
