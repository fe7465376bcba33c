//! Unit of work - one atomic scope over the store gateway.
//!
//! The unit is created by the outermost operation, passed down by `&mut`,
//! and finalized exactly once by that same operation. Inner steps only use
//! [`UnitOfWork::store`]; they never commit or roll back.

use crate::domain::session::BracketError;
use crate::ports::{StoreGateway, Transaction, TransactionManager};

/// Scoped transaction with commit-on-success, rollback-on-error semantics.
///
/// Dropping an unfinalized unit (for example when the request future is
/// cancelled) drops the transaction, which discards its changes.
pub struct UnitOfWork {
    tx: Box<dyn Transaction>,
    finalized: bool,
}

impl UnitOfWork {
    /// Opens a new transaction.
    pub async fn begin(manager: &dyn TransactionManager) -> Result<Self, BracketError> {
        let tx = manager.begin().await?;
        Ok(Self {
            tx,
            finalized: false,
        })
    }

    /// Gateway bound to this unit's transaction.
    pub fn store(&mut self) -> &mut dyn StoreGateway {
        self.tx.gateway()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Commits the transaction. No-op once finalized.
    ///
    /// # Errors
    ///
    /// - `PersistenceFailure` if the commit fails; nothing was applied
    pub async fn commit(&mut self) -> Result<(), BracketError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        self.tx.commit().await.map_err(|err| {
            tracing::warn!(error = %err, "Commit failed, changes discarded");
            BracketError::persistence(err.message)
        })
    }

    /// Rolls the transaction back. No-op once finalized.
    pub async fn rollback(&mut self) -> Result<(), BracketError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        self.tx
            .rollback()
            .await
            .map_err(|err| BracketError::persistence(err.message))
    }

    /// Finalizes the unit from the outcome of the work done in it.
    ///
    /// `Ok` commits and returns the value, unless the commit itself fails.
    /// `Err` rolls back and returns the original error; a failed rollback is
    /// only logged.
    pub async fn finish<T>(mut self, result: Result<T, BracketError>) -> Result<T, BracketError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Rolling back unit of work");
                if let Err(rollback_err) = self.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.finalized {
            tracing::warn!("Unit of work dropped before completion, discarding changes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{
        AppearanceId, DomainError, RoundId, RoundStatus, SessionId, UserId,
    };
    use crate::domain::session::{ChoiceAppearance, Outcome, Round, Session};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    // ════════════════════════════════════════════════════════════════════════════
    // Mock transaction
    // ════════════════════════════════════════════════════════════════════════════

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct RecordingTransaction {
        log: Log,
        fail_commit: bool,
    }

    #[async_trait]
    impl StoreGateway for RecordingTransaction {
        async fn insert_session(&mut self, _session: &Session) -> Result<(), DomainError> {
            self.log.lock().unwrap().push("insert_session");
            Ok(())
        }
        async fn load_session(&mut self, _id: &SessionId) -> Result<Option<Session>, DomainError> {
            Ok(None)
        }
        async fn load_session_for_update(
            &mut self,
            _id: &SessionId,
        ) -> Result<Option<Session>, DomainError> {
            Ok(None)
        }
        async fn list_session_ids(&mut self, _user: &UserId) -> Result<Vec<SessionId>, DomainError> {
            Ok(vec![])
        }
        async fn update_session(&mut self, _session: &Session) -> Result<(), DomainError> {
            Ok(())
        }
        async fn insert_round(&mut self, _round: &Round) -> Result<(), DomainError> {
            Ok(())
        }
        async fn update_round_status(
            &mut self,
            _id: &RoundId,
            _status: RoundStatus,
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn insert_appearances(
            &mut self,
            _appearances: &[ChoiceAppearance],
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn record_outcome(
            &mut self,
            _id: &AppearanceId,
            _outcome: Outcome,
        ) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[async_trait]
    impl Transaction for RecordingTransaction {
        fn gateway(&mut self) -> &mut dyn StoreGateway {
            self
        }
        async fn commit(&mut self) -> Result<(), DomainError> {
            self.log.lock().unwrap().push("commit");
            if self.fail_commit {
                return Err(DomainError::database("disk full"));
            }
            Ok(())
        }
        async fn rollback(&mut self) -> Result<(), DomainError> {
            self.log.lock().unwrap().push("rollback");
            Ok(())
        }
    }

    struct RecordingManager {
        log: Log,
        fail_commit: bool,
    }

    impl RecordingManager {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
                fail_commit: false,
            }
        }

        fn failing_commit() -> Self {
            Self {
                fail_commit: true,
                ..Self::new()
            }
        }

        fn log(&self) -> Vec<&'static str> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransactionManager for RecordingManager {
        async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError> {
            Ok(Box::new(RecordingTransaction {
                log: self.log.clone(),
                fail_commit: self.fail_commit,
            }))
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn finish_commits_on_success() {
        let manager = RecordingManager::new();
        let uow = UnitOfWork::begin(&manager).await.unwrap();

        let value = uow.finish(Ok::<_, BracketError>(7)).await.unwrap();

        assert_eq!(value, 7);
        assert_eq!(manager.log(), vec!["commit"]);
    }

    #[tokio::test]
    async fn finish_rolls_back_on_error() {
        let manager = RecordingManager::new();
        let mut uow = UnitOfWork::begin(&manager).await.unwrap();
        let session = Session::reconstitute(
            SessionId::new(),
            UserId::new("u").unwrap(),
            Default::default(),
            Default::default(),
            1,
            None,
            None,
            vec![],
            Default::default(),
            Default::default(),
        );
        uow.store().insert_session(&session).await.unwrap();

        let err = uow
            .finish::<()>(Err(BracketError::upstream("timed out")))
            .await
            .unwrap_err();

        assert_eq!(err, BracketError::upstream("timed out"));
        assert_eq!(manager.log(), vec!["insert_session", "rollback"]);
    }

    #[tokio::test]
    async fn commit_failure_surfaces_as_persistence_failure() {
        let manager = RecordingManager::failing_commit();
        let uow = UnitOfWork::begin(&manager).await.unwrap();

        let err = uow.finish(Ok::<_, BracketError>(())).await.unwrap_err();

        assert!(matches!(err, BracketError::PersistenceFailure(_)));
        assert_eq!(manager.log(), vec!["commit"]);
    }

    #[tokio::test]
    async fn finalizing_twice_is_a_no_op() {
        let manager = RecordingManager::new();
        let mut uow = UnitOfWork::begin(&manager).await.unwrap();

        uow.commit().await.unwrap();
        uow.commit().await.unwrap();
        uow.rollback().await.unwrap();

        assert!(uow.is_finalized());
        assert_eq!(manager.log(), vec!["commit"]);
    }

    #[tokio::test]
    async fn dropping_unfinalized_unit_runs_neither() {
        let manager = RecordingManager::new();
        {
            let _uow = UnitOfWork::begin(&manager).await.unwrap();
        }
        assert!(manager.log().is_empty());
    }
}
