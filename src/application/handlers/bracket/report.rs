//! Report generation shared by `advance` and the regenerate operation.

use crate::domain::bracket::finalists;
use crate::domain::foundation::ErrorCode;
use crate::domain::session::{BracketError, Report, Session};
use crate::ports::{ContentGenerator, GenerationContext};

/// Picks the finalists, asks the generator for a report and attaches it to
/// the (finished) session. The caller persists the session.
///
/// # Errors
///
/// - `InvalidState` (`NotEnoughWinners`) with fewer than three distinct winners
/// - `InvalidState` if the session is not finished
/// - `UpstreamGeneratorFailure` if the generator fails
pub(crate) async fn write_report(
    generator: &dyn ContentGenerator,
    session: &mut Session,
) -> Result<Report, BracketError> {
    if !session.is_finished() {
        return Err(BracketError::invalid_state(
            ErrorCode::InvalidStateTransition,
            format!("Session {} is not finished", session.id()),
        ));
    }
    let finalists = finalists(session.rounds())?;
    let context = GenerationContext::new(*session.id(), session.base_information().clone());

    let report = generator.summarize(&context, &finalists).await?;
    session.attach_report(report.clone())?;

    tracing::info!(
        session_id = %session.id(),
        finalists = ?finalists.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
        "Report generated"
    );
    Ok(report)
}
