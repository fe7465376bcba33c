//! GenerateReportHandler - regenerates the report of a finished session.

use std::sync::Arc;

use crate::application::{SessionLocks, UnitOfWork};
use crate::domain::foundation::{SessionId, UserId};
use crate::domain::session::{BracketError, Report};
use crate::ports::{ContentGenerator, TransactionManager};

use super::report::write_report;
use super::session_loader::load_owned_session;

/// Command to (re)generate a finished session's report.
#[derive(Debug, Clone)]
pub struct GenerateReportCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
}

/// Handler for report regeneration.
///
/// Shares the session locks with `advance`, so it never interleaves with a
/// step on the same session.
pub struct GenerateReportHandler {
    transactions: Arc<dyn TransactionManager>,
    generator: Arc<dyn ContentGenerator>,
    locks: SessionLocks,
}

impl GenerateReportHandler {
    pub fn new(
        transactions: Arc<dyn TransactionManager>,
        generator: Arc<dyn ContentGenerator>,
        locks: SessionLocks,
    ) -> Self {
        Self {
            transactions,
            generator,
            locks,
        }
    }

    pub async fn handle(&self, cmd: GenerateReportCommand) -> Result<Report, BracketError> {
        let _guard = self.locks.try_acquire(cmd.session_id)?;

        let mut uow = UnitOfWork::begin(self.transactions.as_ref()).await?;
        let result = self.generate(&mut uow, &cmd).await;
        uow.finish(result).await
    }

    async fn generate(
        &self,
        uow: &mut UnitOfWork,
        cmd: &GenerateReportCommand,
    ) -> Result<Report, BracketError> {
        let mut session =
            load_owned_session(uow.store(), &cmd.session_id, &cmd.user_id, true).await?;

        let report = write_report(self.generator.as_ref(), &mut session).await?;
        uow.store().update_session(&session).await?;
        Ok(report)
    }
}
