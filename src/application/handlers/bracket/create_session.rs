//! CreateSessionHandler - Command handler for starting a new bracket session.

use std::sync::Arc;

use crate::application::UnitOfWork;
use crate::domain::foundation::{SessionId, UserId};
use crate::domain::session::{BaseInformation, BracketError, Session};
use crate::ports::TransactionManager;

/// Command to create a new session.
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub user_id: UserId,
    pub base_information: BaseInformation,
}

/// Result of successful session creation.
#[derive(Debug, Clone)]
pub struct CreateSessionResult {
    pub session: Session,
}

/// Handler for creating sessions.
pub struct CreateSessionHandler {
    transactions: Arc<dyn TransactionManager>,
}

impl CreateSessionHandler {
    pub fn new(transactions: Arc<dyn TransactionManager>) -> Self {
        Self { transactions }
    }

    pub async fn handle(
        &self,
        cmd: CreateSessionCommand,
    ) -> Result<CreateSessionResult, BracketError> {
        // 1. Build the aggregate (validates the questionnaire)
        let session = Session::new(SessionId::new(), cmd.user_id, cmd.base_information)?;

        // 2. Persist
        let mut uow = UnitOfWork::begin(self.transactions.as_ref()).await?;
        let result = uow.store().insert_session(&session).await.map_err(Into::into);
        uow.finish(result).await?;

        tracing::info!(
            session_id = %session.id(),
            user_id = %session.user_id(),
            "Session created"
        );
        Ok(CreateSessionResult { session })
    }
}
