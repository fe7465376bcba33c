//! AdvanceSessionHandler - the elimination-bracket orchestrator.
//!
//! Each call applies the outcome of the pending comparison (if any) and
//! moves the session to its next step:
//!
//! ```text
//! no rounds, no outcome ─────────────► START_ROUND (round 1, default set)
//! outcome applied, ≥2 remaining ─────► NEXT_COMPARISON
//! outcome applied, ≤1 remaining ─────► close round (+ bye)
//!     several winners / drill-down ──► START_ROUND
//!     sole winner, no expansion ─────► REPORT_READY (session finished)
//! ```
//!
//! The whole step runs in one unit of work under the session's lock.

use std::sync::Arc;

use crate::application::{SessionLocks, UnitOfWork};
use crate::domain::bracket::{remaining, sample_pair, winners_and_next};
use crate::domain::foundation::{AppearanceId, ErrorCode, RoundStatus, SessionId, UserId};
use crate::domain::session::{
    BracketError, Category, ChoiceAppearance, Outcome, Report, Round, Session,
};
use crate::ports::{CategoryExpansions, ContentGenerator, GenerationContext, TransactionManager};

use super::report::write_report;
use super::session_loader::load_owned_session;

/// Result of the comparison the user was shown last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonOutcome {
    pub winner: AppearanceId,
    pub loser: AppearanceId,
}

/// Command to advance a session by one step.
#[derive(Debug, Clone)]
pub struct AdvanceSessionCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// `None` only on the very first call.
    pub outcome: Option<ComparisonOutcome>,
}

/// A pair of appearances awaiting the user's choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub round_number: u32,
    pub first: ChoiceAppearance,
    pub second: ChoiceAppearance,
}

/// What the client should show next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// A new round began; its first comparison is included.
    StartRound {
        round_number: u32,
        categories: Vec<Category>,
        comparison: Comparison,
    },
    /// Next comparison within the current round.
    NextComparison { comparison: Comparison },
    /// The bracket is over.
    ///
    /// `report` is `None` when the history holds fewer than three distinct
    /// winners; the session is finished either way.
    ReportReady {
        final_category: Category,
        report: Option<Report>,
    },
}

impl NextAction {
    pub fn kind(&self) -> &'static str {
        match self {
            NextAction::StartRound { .. } => "START_ROUND",
            NextAction::NextComparison { .. } => "NEXT_COMPARISON",
            NextAction::ReportReady { .. } => "REPORT_READY",
        }
    }
}

/// Handler for advancing a session through the bracket.
pub struct AdvanceSessionHandler {
    transactions: Arc<dyn TransactionManager>,
    generator: Arc<dyn ContentGenerator>,
    expansions: Arc<dyn CategoryExpansions>,
    locks: SessionLocks,
    default_categories: Vec<Category>,
}

impl AdvanceSessionHandler {
    pub fn new(
        transactions: Arc<dyn TransactionManager>,
        generator: Arc<dyn ContentGenerator>,
        expansions: Arc<dyn CategoryExpansions>,
        locks: SessionLocks,
        default_categories: Vec<Category>,
    ) -> Self {
        Self {
            transactions,
            generator,
            expansions,
            locks,
            default_categories,
        }
    }

    pub async fn handle(&self, cmd: AdvanceSessionCommand) -> Result<NextAction, BracketError> {
        let _guard = self.locks.try_acquire(cmd.session_id)?;

        let mut uow = UnitOfWork::begin(self.transactions.as_ref()).await?;
        let result = self.advance(&mut uow, &cmd).await;
        uow.finish(result).await
    }

    async fn advance(
        &self,
        uow: &mut UnitOfWork,
        cmd: &AdvanceSessionCommand,
    ) -> Result<NextAction, BracketError> {
        // 1. Load and authorize
        let mut session =
            load_owned_session(uow.store(), &cmd.session_id, &cmd.user_id, true).await?;
        session.ensure_ongoing()?;
        let context = GenerationContext::new(*session.id(), session.base_information().clone());

        // 2. First call starts round 1; later calls must carry an outcome
        match (session.rounds().is_empty(), cmd.outcome) {
            (true, None) => {
                let categories = self.default_categories.clone();
                return self.start_round(uow, &mut session, &context, categories).await;
            }
            (true, Some(_)) => {
                return Err(BracketError::invalid_state(
                    ErrorCode::InvalidStateTransition,
                    "No comparison is pending before the first round",
                ));
            }
            (false, None) => {
                return Err(BracketError::invalid_state(
                    ErrorCode::InvalidStateTransition,
                    "An outcome is required once the bracket has started",
                ));
            }
            (false, Some(outcome)) => self.apply_outcome(uow, &mut session, outcome).await?,
        }

        // 3. Decide the next step from what is left in the round
        let round = session
            .active_round()
            .ok_or_else(|| no_active_round(session.id()))?;
        let left = remaining(round);
        tracing::debug!(
            session_id = %session.id(),
            round_number = round.round_number(),
            remaining = left.len(),
            "Outcome applied"
        );

        if left.len() >= 2 {
            let comparison = self
                .present_comparison(uow, &mut session, &context, &left)
                .await?;
            return Ok(NextAction::NextComparison { comparison });
        }

        let closed = self
            .close_round(uow, &mut session, left.into_iter().next())
            .await?;
        let result = winners_and_next(&closed, self.expansions.as_ref())?;

        match result.final_category().cloned() {
            Some(final_category) => self.finish(uow, &mut session, final_category).await,
            None => {
                self.start_round(uow, &mut session, &context, result.next_round)
                    .await
            }
        }
    }

    /// Records winner and loser on two undecided appearances of the active round.
    async fn apply_outcome(
        &self,
        uow: &mut UnitOfWork,
        session: &mut Session,
        outcome: ComparisonOutcome,
    ) -> Result<(), BracketError> {
        if outcome.winner == outcome.loser {
            return Err(BracketError::invalid_state(
                ErrorCode::ValidationFailed,
                "Winner and loser must be different appearances",
            ));
        }

        let session_id = *session.id();
        let round = session
            .active_round_mut()
            .ok_or_else(|| no_active_round(&session_id))?;

        for (id, result) in [
            (outcome.winner, Outcome::Winner),
            (outcome.loser, Outcome::Loser),
        ] {
            let appearance = round.appearance_mut(&id).ok_or_else(|| BracketError::NotFound {
                code: ErrorCode::AppearanceNotFound,
                message: format!("Appearance not found: {}", id),
            })?;
            appearance.decide(result)?;
            uow.store().record_outcome(&id, result).await?;
        }
        Ok(())
    }

    /// Samples two candidates, asks for their descriptions and persists the pair.
    async fn present_comparison(
        &self,
        uow: &mut UnitOfWork,
        session: &mut Session,
        context: &GenerationContext,
        candidates: &[Category],
    ) -> Result<Comparison, BracketError> {
        let (first, second) = {
            let mut rng = rand::thread_rng();
            sample_pair(candidates, &mut rng)?
        };
        tracing::debug!(
            session_id = %session.id(),
            first = %first,
            second = %second,
            "Sampled comparison"
        );

        let revealed = self.generator.reveal(context, &first, &second).await?;

        let session_id = *session.id();
        let round = session
            .active_round_mut()
            .ok_or_else(|| no_active_round(&session_id))?;
        let first = round.add_appearance(first, revealed.first)?.clone();
        let second = round.add_appearance(second, revealed.second)?.clone();
        let round_number = round.round_number();

        uow.store()
            .insert_appearances(&[first.clone(), second.clone()])
            .await?;

        Ok(Comparison {
            round_number,
            first,
            second,
        })
    }

    /// Opens a round over `categories` together with its first comparison.
    async fn start_round(
        &self,
        uow: &mut UnitOfWork,
        session: &mut Session,
        context: &GenerationContext,
        categories: Vec<Category>,
    ) -> Result<NextAction, BracketError> {
        let round = session.start_round(categories)?.clone();
        uow.store().insert_round(&round).await?;
        uow.store().update_session(session).await?;

        tracing::info!(
            session_id = %session.id(),
            round_number = round.round_number(),
            categories = round.eligible().len(),
            "Round started"
        );

        let comparison = self
            .present_comparison(uow, session, context, round.eligible())
            .await?;

        Ok(NextAction::StartRound {
            round_number: round.round_number(),
            categories: round.eligible().to_vec(),
            comparison,
        })
    }

    /// Gives the leftover category (if any) a bye and completes the round.
    async fn close_round(
        &self,
        uow: &mut UnitOfWork,
        session: &mut Session,
        bye: Option<Category>,
    ) -> Result<Round, BracketError> {
        let session_id = *session.id();
        let round = session
            .active_round_mut()
            .ok_or_else(|| no_active_round(&session_id))?;

        if let Some(category) = bye {
            let description = category.bye_description();
            let appearance = round.add_appearance(category, description)?.clone();
            uow.store()
                .insert_appearances(std::slice::from_ref(&appearance))
                .await?;

            round
                .appearance_mut(appearance.id())
                .ok_or_else(|| no_active_round(&session_id))?
                .decide(Outcome::Winner)?;
            uow.store()
                .record_outcome(appearance.id(), Outcome::Winner)
                .await?;

            tracing::debug!(
                session_id = %session_id,
                category = %appearance.category(),
                "Bye granted"
            );
        }

        round.complete()?;
        uow.store()
            .update_round_status(round.id(), RoundStatus::Completed)
            .await?;
        Ok(round.clone())
    }

    /// Finishes the session on its final category and writes the report.
    async fn finish(
        &self,
        uow: &mut UnitOfWork,
        session: &mut Session,
        final_category: Category,
    ) -> Result<NextAction, BracketError> {
        session.finish(final_category.clone())?;

        let report = match write_report(self.generator.as_ref(), session).await {
            Ok(report) => Some(report),
            Err(BracketError::InvalidState {
                code: ErrorCode::NotEnoughWinners,
                message,
            }) => {
                tracing::warn!(session_id = %session.id(), %message, "Finished without a report");
                None
            }
            Err(err) => return Err(err),
        };
        uow.store().update_session(session).await?;

        tracing::info!(
            session_id = %session.id(),
            final_category = %final_category,
            "Session finished"
        );
        Ok(NextAction::ReportReady {
            final_category,
            report,
        })
    }
}

fn no_active_round(session_id: &SessionId) -> BracketError {
    BracketError::invalid_state(
        ErrorCode::InconsistentRound,
        format!("Session {} has no active round", session_id),
    )
}
