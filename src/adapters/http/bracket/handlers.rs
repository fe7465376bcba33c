//! HTTP handlers for bracket endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::bracket::{
    AdvanceSessionCommand, AdvanceSessionHandler, CreateSessionCommand, CreateSessionHandler,
    GenerateReportCommand, GenerateReportHandler, GetSessionHandler, GetSessionQuery,
    ListSessionsHandler, ListSessionsQuery,
};
use crate::domain::foundation::{ErrorCode, SessionId};
use crate::domain::session::BracketError;

use super::dto::{
    AdvanceSessionRequest, CreateSessionRequest, CreateSessionResponse, ErrorResponse,
    NextActionResponse, ReportResponse, SessionListResponse, SessionResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct BracketHandlers {
    create_handler: Arc<CreateSessionHandler>,
    advance_handler: Arc<AdvanceSessionHandler>,
    get_handler: Arc<GetSessionHandler>,
    list_handler: Arc<ListSessionsHandler>,
    report_handler: Arc<GenerateReportHandler>,
}

impl BracketHandlers {
    pub fn new(
        create_handler: Arc<CreateSessionHandler>,
        advance_handler: Arc<AdvanceSessionHandler>,
        get_handler: Arc<GetSessionHandler>,
        list_handler: Arc<ListSessionsHandler>,
        report_handler: Arc<GenerateReportHandler>,
    ) -> Self {
        Self {
            create_handler,
            advance_handler,
            get_handler,
            list_handler,
            report_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions - Create a new session
pub async fn create_session(
    State(handlers): State<BracketHandlers>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    let cmd = CreateSessionCommand {
        user_id: user.id,
        base_information: req.base_information,
    };

    match handlers.create_handler.handle(cmd).await {
        Ok(result) => {
            let response = CreateSessionResponse {
                session_id: result.session.id().to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => handle_bracket_error(e),
    }
}

/// GET /api/sessions - List the caller's sessions
pub async fn list_sessions(
    State(handlers): State<BracketHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    let query = ListSessionsQuery { user_id: user.id };

    match handlers.list_handler.handle(query).await {
        Ok(ids) => (StatusCode::OK, Json(SessionListResponse::from(ids))).into_response(),
        Err(e) => handle_bracket_error(e),
    }
}

/// GET /api/sessions/:id - Full session tree
pub async fn get_session(
    State(handlers): State<BracketHandlers>,
    RequireAuth(user): RequireAuth,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let query = GetSessionQuery {
        session_id,
        user_id: user.id,
    };

    match handlers.get_handler.handle(query).await {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(&session))).into_response(),
        Err(e) => handle_bracket_error(e),
    }
}

/// POST /api/sessions/:id/advance - Submit an outcome and get the next action
pub async fn advance_session(
    State(handlers): State<BracketHandlers>,
    RequireAuth(user): RequireAuth,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let req = match parse_advance_body(&body) {
        Ok(req) => req,
        Err(response) => return response,
    };

    let cmd = AdvanceSessionCommand {
        session_id,
        user_id: user.id,
        outcome: req.outcome.map(Into::into),
    };

    match handlers.advance_handler.handle(cmd).await {
        Ok(action) => (StatusCode::OK, Json(NextActionResponse::from(&action))).into_response(),
        Err(e) => handle_bracket_error(e),
    }
}

/// POST /api/sessions/:id/report - Regenerate the report of a finished session
pub async fn generate_report(
    State(handlers): State<BracketHandlers>,
    RequireAuth(user): RequireAuth,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = GenerateReportCommand {
        session_id,
        user_id: user.id,
    };

    match handlers.report_handler.handle(cmd).await {
        Ok(report) => (StatusCode::OK, Json(ReportResponse::from(&report))).into_response(),
        Err(e) => handle_bracket_error(e),
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, Response> {
    raw.parse::<SessionId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Invalid session ID")),
        )
            .into_response()
    })
}

/// An empty body means "no outcome"; anything else must parse in full.
fn parse_advance_body(body: &[u8]) -> Result<AdvanceSessionRequest, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AdvanceSessionRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(format!("Invalid advance request: {}", e))),
        )
            .into_response()
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

pub(crate) fn status_for(error: &BracketError) -> StatusCode {
    match error {
        BracketError::NotFound { .. } => StatusCode::NOT_FOUND,
        BracketError::InvalidState {
            code: ErrorCode::ValidationFailed,
            ..
        } => StatusCode::UNPROCESSABLE_ENTITY,
        BracketError::InvalidState { .. } => StatusCode::CONFLICT,
        BracketError::ConflictBusy(_) => StatusCode::CONFLICT,
        BracketError::UpstreamGeneratorFailure(_) => StatusCode::BAD_GATEWAY,
        BracketError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn handle_bracket_error(error: BracketError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(code = %error.code(), error = %error, "Bracket request failed");
    }
    (
        status,
        Json(ErrorResponse::new(error.code().to_string(), error.message())),
    )
        .into_response()
}
