//! ListSessionsHandler - Query handler for a user's session IDs.

use std::sync::Arc;

use crate::application::UnitOfWork;
use crate::domain::foundation::{SessionId, UserId};
use crate::domain::session::BracketError;
use crate::ports::TransactionManager;

/// Query to list the caller's sessions.
#[derive(Debug, Clone)]
pub struct ListSessionsQuery {
    pub user_id: UserId,
}

/// Handler for listing session IDs, newest first.
pub struct ListSessionsHandler {
    transactions: Arc<dyn TransactionManager>,
}

impl ListSessionsHandler {
    pub fn new(transactions: Arc<dyn TransactionManager>) -> Self {
        Self { transactions }
    }

    pub async fn handle(&self, query: ListSessionsQuery) -> Result<Vec<SessionId>, BracketError> {
        let mut uow = UnitOfWork::begin(self.transactions.as_ref()).await?;
        let result = uow
            .store()
            .list_session_ids(&query.user_id)
            .await
            .map_err(Into::into);
        uow.finish(result).await
    }
}
