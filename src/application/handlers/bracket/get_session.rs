//! GetSessionHandler - Query handler for a session's full tree.

use std::sync::Arc;

use crate::application::UnitOfWork;
use crate::domain::foundation::{SessionId, UserId};
use crate::domain::session::{BracketError, Session};
use crate::ports::TransactionManager;

use super::session_loader::load_owned_session;

/// Query to get a session by ID.
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
    pub user_id: UserId,
}

/// Handler for retrieving a session with its rounds and appearances.
pub struct GetSessionHandler {
    transactions: Arc<dyn TransactionManager>,
}

impl GetSessionHandler {
    pub fn new(transactions: Arc<dyn TransactionManager>) -> Self {
        Self { transactions }
    }

    pub async fn handle(&self, query: GetSessionQuery) -> Result<Session, BracketError> {
        let mut uow = UnitOfWork::begin(self.transactions.as_ref()).await?;
        let result =
            load_owned_session(uow.store(), &query.session_id, &query.user_id, false).await;
        uow.finish(result).await
    }
}
