//! HTTP DTOs for bracket endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::handlers::bracket::{Comparison, ComparisonOutcome, NextAction};
use crate::domain::foundation::{AppearanceId, SessionId};
use crate::domain::session::{BaseInformation, ChoiceAppearance, Report, Round, Session};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to create a new session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub base_information: BaseInformation,
}

/// Outcome of the comparison the client was shown last.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutcomeRequest {
    pub winner_id: AppearanceId,
    pub loser_id: AppearanceId,
}

impl From<OutcomeRequest> for ComparisonOutcome {
    fn from(req: OutcomeRequest) -> Self {
        Self {
            winner: req.winner_id,
            loser: req.loser_id,
        }
    }
}

/// Request to advance a session. The outcome is omitted on the first call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvanceSessionRequest {
    #[serde(default)]
    pub outcome: Option<OutcomeRequest>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Response after creating a session.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// The caller's sessions, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub session_ids: Vec<String>,
}

impl From<Vec<SessionId>> for SessionListResponse {
    fn from(ids: Vec<SessionId>) -> Self {
        Self {
            session_ids: ids.iter().map(ToString::to_string).collect(),
        }
    }
}

/// One category's slot in a comparison.
#[derive(Debug, Clone, Serialize)]
pub struct AppearanceResponse {
    pub id: String,
    pub category: String,
    pub description: String,
    pub appearance_index: u32,
    /// `null` until decided.
    pub is_winner: Option<bool>,
}

impl From<&ChoiceAppearance> for AppearanceResponse {
    fn from(appearance: &ChoiceAppearance) -> Self {
        Self {
            id: appearance.id().to_string(),
            category: appearance.category().to_string(),
            description: appearance.description().to_string(),
            appearance_index: appearance.appearance_index(),
            is_winner: appearance.outcome().as_flag(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundResponse {
    pub id: String,
    pub round_number: u32,
    pub status: String,
    pub categories: Vec<String>,
    pub appearances: Vec<AppearanceResponse>,
}

impl From<&Round> for RoundResponse {
    fn from(round: &Round) -> Self {
        Self {
            id: round.id().to_string(),
            round_number: round.round_number(),
            status: round.status().to_string(),
            categories: round.eligible().iter().map(ToString::to_string).collect(),
            appearances: round.appearances().iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub final_three_majors: Vec<String>,
    pub final_three_majors_report: Vec<String>,
    pub final_recommendation: String,
}

impl From<&Report> for ReportResponse {
    fn from(report: &Report) -> Self {
        Self {
            final_three_majors: report.final_three_majors.clone(),
            final_three_majors_report: report.final_three_majors_report.clone(),
            final_recommendation: report.final_recommendation.clone(),
        }
    }
}

/// Full session tree.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub current_round_number: u32,
    pub final_category: Option<String>,
    pub base_information: BaseInformation,
    pub report: Option<ReportResponse>,
    pub rounds: Vec<RoundResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            user_id: session.user_id().to_string(),
            status: session.status().to_string(),
            current_round_number: session.current_round_number(),
            final_category: session.final_category().map(ToString::to_string),
            base_information: session.base_information().clone(),
            report: session.report().map(Into::into),
            rounds: session.rounds().iter().map(Into::into).collect(),
            created_at: session.created_at().as_datetime().to_rfc3339(),
            updated_at: session.updated_at().as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResponse {
    pub round_number: u32,
    pub choices: [AppearanceResponse; 2],
}

impl From<&Comparison> for ComparisonResponse {
    fn from(comparison: &Comparison) -> Self {
        Self {
            round_number: comparison.round_number,
            choices: [(&comparison.first).into(), (&comparison.second).into()],
        }
    }
}

/// What the client should show next, tagged by `operation`.
#[derive(Debug, Clone, Serialize)]
pub struct NextActionResponse {
    pub operation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportResponse>,
}

impl From<&NextAction> for NextActionResponse {
    fn from(action: &NextAction) -> Self {
        let mut response = Self {
            operation: action.kind(),
            round_number: None,
            categories: None,
            comparison: None,
            final_category: None,
            report: None,
        };
        match action {
            NextAction::StartRound {
                round_number,
                categories,
                comparison,
            } => {
                response.round_number = Some(*round_number);
                response.categories = Some(categories.iter().map(ToString::to_string).collect());
                response.comparison = Some(comparison.into());
            }
            NextAction::NextComparison { comparison } => {
                response.round_number = Some(comparison.round_number);
                response.comparison = Some(comparison.into());
            }
            NextAction::ReportReady {
                final_category,
                report,
            } => {
                response.final_category = Some(final_category.to_string());
                response.report = report.as_ref().map(Into::into);
            }
        }
        response
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::Category;

    #[test]
    fn advance_request_without_outcome_parses() {
        let req: AdvanceSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.outcome.is_none());
    }

    #[test]
    fn advance_request_with_outcome_parses() {
        let json = r#"{"outcome": {
            "winner_id": "550e8400-e29b-41d4-a716-446655440000",
            "loser_id": "550e8400-e29b-41d4-a716-446655440001"
        }}"#;
        let req: AdvanceSessionRequest = serde_json::from_str(json).unwrap();
        let outcome: ComparisonOutcome = req.outcome.unwrap().into();
        assert_eq!(
            outcome.winner.to_string(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn report_ready_omits_comparison_fields() {
        let action = NextAction::ReportReady {
            final_category: Category::new("医学").unwrap(),
            report: None,
        };
        let json = serde_json::to_value(NextActionResponse::from(&action)).unwrap();

        assert_eq!(json["operation"], "REPORT_READY");
        assert_eq!(json["final_category"], "医学");
        assert!(json.get("comparison").is_none());
        assert!(json.get("report").is_none());
    }

    #[test]
    fn session_list_serializes_ids() {
        let id = SessionId::new();
        let json = serde_json::to_value(SessionListResponse::from(vec![id])).unwrap();
        assert_eq!(json["session_ids"][0], id.to_string());
    }
}
