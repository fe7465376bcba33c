//! In-memory store with snapshot-isolated transactions.
//!
//! Committed tables sit behind an `Arc`. A transaction shares that snapshot
//! at `begin` and only takes a private copy on its first write, so reads
//! never copy. On commit, every session it touched is merged back, provided
//! nobody else committed a change to that session in the meantime.
//! Rollback, or simply dropping the transaction, discards the copy.
//!
//! A write copies every table, so cost grows with the number of stored
//! sessions. Not suitable for multi-process deployments.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::domain::foundation::{
    AppearanceId, DomainError, RoundId, RoundStatus, SessionId, UserId,
};
use crate::domain::session::{ChoiceAppearance, Outcome, Round, Session};
use crate::ports::{StoreGateway, Transaction, TransactionManager};

use super::tables::Tables;

/// Operations that can be made to fail once, for exercising rollback paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    InsertSession,
    UpdateSession,
    InsertRound,
    UpdateRoundStatus,
    InsertAppearances,
    RecordOutcome,
    Commit,
}

#[derive(Default)]
struct Shared {
    tables: RwLock<Arc<Tables>>,
    next_seq: AtomicU64,
    fail_points: Mutex<Vec<FailPoint>>,
}

impl Shared {
    /// Consumes a pending fail point, returning the injected error.
    fn trip(&self, point: FailPoint) -> Result<(), DomainError> {
        let mut pending = self.fail_points.lock().unwrap_or_else(|e| e.into_inner());
        match pending.iter().position(|p| *p == point) {
            Some(index) => {
                pending.remove(index);
                Err(DomainError::database(format!(
                    "injected failure at {:?}",
                    point
                )))
            }
            None => Ok(()),
        }
    }
}

/// In-memory transaction manager and store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call to `point` fail with a `DatabaseError`.
    pub fn fail_next(&self, point: FailPoint) {
        self.shared
            .fail_points
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(point);
    }

    /// Committed state of a session, outside any transaction.
    pub async fn snapshot(&self, id: &SessionId) -> Option<Session> {
        self.shared.tables.read().await.load_session(id)
    }

    /// Number of committed sessions.
    pub async fn session_count(&self) -> usize {
        self.shared.tables.read().await.session_count()
    }
}

#[async_trait]
impl TransactionManager for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError> {
        self.shared.trip(FailPoint::Begin)?;
        Ok(Box::new(self.open().await))
    }
}

impl InMemoryStore {
    async fn open(&self) -> InMemoryTransaction {
        let base = Arc::clone(&*self.shared.tables.read().await);
        InMemoryTransaction {
            shared: self.shared.clone(),
            staged: Arc::clone(&base),
            base,
            touched: HashSet::new(),
            finished: false,
        }
    }
}

/// One open in-memory transaction.
pub struct InMemoryTransaction {
    shared: Arc<Shared>,
    /// Tables as they were at `begin`, for conflict detection.
    base: Arc<Tables>,
    /// Shares `base` until the first write.
    staged: Arc<Tables>,
    touched: HashSet<SessionId>,
    finished: bool,
}

impl InMemoryTransaction {
    fn staged_mut(&mut self) -> &mut Tables {
        Arc::make_mut(&mut self.staged)
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.finished {
            Err(DomainError::database("transaction already finished"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StoreGateway for InMemoryTransaction {
    async fn insert_session(&mut self, session: &Session) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.shared.trip(FailPoint::InsertSession)?;
        let seq = self.shared.next_seq.fetch_add(1, Ordering::SeqCst);
        self.staged_mut().insert_session(session, seq)?;
        self.touched.insert(*session.id());
        Ok(())
    }

    async fn load_session(&mut self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        self.ensure_open()?;
        Ok(self.staged.load_session(id))
    }

    async fn load_session_for_update(
        &mut self,
        id: &SessionId,
    ) -> Result<Option<Session>, DomainError> {
        self.load_session(id).await
    }

    async fn list_session_ids(&mut self, user_id: &UserId) -> Result<Vec<SessionId>, DomainError> {
        self.ensure_open()?;
        Ok(self.staged.list_session_ids(user_id))
    }

    async fn update_session(&mut self, session: &Session) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.shared.trip(FailPoint::UpdateSession)?;
        self.staged_mut().update_session(session)?;
        self.touched.insert(*session.id());
        Ok(())
    }

    async fn insert_round(&mut self, round: &Round) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.shared.trip(FailPoint::InsertRound)?;
        self.staged_mut().insert_round(round)?;
        self.touched.insert(*round.session_id());
        Ok(())
    }

    async fn update_round_status(
        &mut self,
        id: &RoundId,
        status: RoundStatus,
    ) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.shared.trip(FailPoint::UpdateRoundStatus)?;
        let session_id = self.staged_mut().update_round_status(id, status)?;
        self.touched.insert(session_id);
        Ok(())
    }

    async fn insert_appearances(
        &mut self,
        appearances: &[ChoiceAppearance],
    ) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.shared.trip(FailPoint::InsertAppearances)?;
        let sessions = self.staged_mut().insert_appearances(appearances)?;
        self.touched.extend(sessions);
        Ok(())
    }

    async fn record_outcome(
        &mut self,
        id: &AppearanceId,
        outcome: Outcome,
    ) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.shared.trip(FailPoint::RecordOutcome)?;
        let session_id = self.staged_mut().record_outcome(id, outcome)?;
        self.touched.insert(session_id);
        Ok(())
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    fn gateway(&mut self) -> &mut dyn StoreGateway {
        self
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.finished = true;
        self.shared.trip(FailPoint::Commit)?;

        if self.touched.is_empty() {
            return Ok(());
        }

        let mut tables = self.shared.tables.write().await;
        for session_id in &self.touched {
            if tables.version_of(session_id) != self.base.version_of(session_id)
                || (tables.session_exists(session_id) && !self.base.session_exists(session_id))
            {
                return Err(DomainError::database(format!(
                    "could not serialize access to session {}",
                    session_id
                )));
            }
        }
        let committed = Arc::make_mut(&mut *tables);
        for session_id in &self.touched {
            committed.merge_session(&self.staged, session_id);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DomainError> {
        self.finished = true;
        self.touched.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::session::{BaseInformation, Category};

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn session_for(user_id: UserId) -> Session {
        let info = BaseInformation {
            max_living_expenses_from_parents: "1".into(),
            enough_savings_for_college: "1".into(),
            pocket_money_usage: "1".into(),
            willing_to_repeat_high_school_for_money: "1".into(),
            city_tier: "1".into(),
            parents_in_public_sector: "1".into(),
            has_stable_hobby: "1".into(),
            self_learning_after_gaokao: "1".into(),
            proactive_in_competitions: "1".into(),
            likes_reading_extracurricular_books: "1".into(),
        };
        Session::new(SessionId::new(), user_id, info).unwrap()
    }

    fn categories(names: &[&str]) -> Vec<Category> {
        names.iter().map(|n| Category::new(*n).unwrap()).collect()
    }

    async fn committed_session(store: &InMemoryStore) -> Session {
        let session = session_for(user());
        let mut tx = store.begin().await.unwrap();
        tx.gateway().insert_session(&session).await.unwrap();
        tx.commit().await.unwrap();
        session
    }

    #[tokio::test]
    async fn reads_share_the_committed_tables() {
        let store = InMemoryStore::new();
        let session = committed_session(&store).await;

        let mut tx = store.open().await;
        assert!(tx.load_session(session.id()).await.unwrap().is_some());
        tx.list_session_ids(&user()).await.unwrap();

        let committed = Arc::clone(&*store.shared.tables.read().await);
        assert!(Arc::ptr_eq(&tx.staged, &committed));
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn first_write_takes_a_private_copy() {
        let store = InMemoryStore::new();
        let mut session = committed_session(&store).await;
        session.start_round(categories(&["a", "b"])).unwrap();

        let mut tx = store.open().await;
        tx.update_session(&session).await.unwrap();

        let committed = Arc::clone(&*store.shared.tables.read().await);
        assert!(!Arc::ptr_eq(&tx.staged, &committed));
        assert!(Arc::ptr_eq(&tx.base, &committed));
    }

    #[tokio::test]
    async fn committed_changes_are_visible() {
        let store = InMemoryStore::new();
        let session = committed_session(&store).await;

        let loaded = store.snapshot(session.id()).await.unwrap();
        assert_eq!(loaded, session);
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn rolled_back_changes_are_discarded() {
        let store = InMemoryStore::new();
        let session = session_for(user());

        let mut tx = store.begin().await.unwrap();
        tx.gateway().insert_session(&session).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(store.snapshot(session.id()).await.is_none());
    }

    #[tokio::test]
    async fn dropped_transaction_is_discarded() {
        let store = InMemoryStore::new();
        let session = session_for(user());
        {
            let mut tx = store.begin().await.unwrap();
            tx.gateway().insert_session(&session).await.unwrap();
        }
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn uncommitted_changes_are_invisible_to_other_transactions() {
        let store = InMemoryStore::new();
        let session = session_for(user());

        let mut writer = store.begin().await.unwrap();
        writer.gateway().insert_session(&session).await.unwrap();

        let mut reader = store.begin().await.unwrap();
        assert!(reader.gateway().load_session(session.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conflicting_commit_is_rejected() {
        let store = InMemoryStore::new();
        let mut session = committed_session(&store).await;
        session.start_round(categories(&["a", "b"])).unwrap();
        let round = session.rounds()[0].clone();

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        first.gateway().insert_round(&round).await.unwrap();
        second.gateway().update_session(&session).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[tokio::test]
    async fn second_active_round_is_rejected() {
        let store = InMemoryStore::new();
        let session = committed_session(&store).await;
        let a = Round::new(*session.id(), 1, categories(&["a", "b"])).unwrap();
        let b = Round::new(*session.id(), 2, categories(&["c", "d"])).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.gateway().insert_round(&a).await.unwrap();
        let err = tx.gateway().insert_round(&b).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn outcome_is_recorded_once() {
        let store = InMemoryStore::new();
        let mut session = committed_session(&store).await;
        let round = session.start_round(categories(&["a", "b"])).unwrap();
        let appearance = round
            .add_appearance(Category::new("a").unwrap(), "text")
            .unwrap()
            .clone();
        let round = round.clone();

        let mut tx = store.begin().await.unwrap();
        tx.gateway().insert_round(&round).await.unwrap();
        tx.gateway().insert_appearances(&[appearance.clone()]).await.unwrap();
        tx.gateway()
            .record_outcome(appearance.id(), Outcome::Winner)
            .await
            .unwrap();
        let err = tx
            .gateway()
            .record_outcome(appearance.id(), Outcome::Loser)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OutcomeAlreadyDecided);
        tx.commit().await.unwrap();

        let loaded = store.snapshot(session.id()).await.unwrap();
        assert!(loaded.rounds()[0].appearances()[0].is_winner());
    }

    #[tokio::test]
    async fn duplicate_appearance_slot_is_rejected() {
        let store = InMemoryStore::new();
        let mut session = committed_session(&store).await;
        let round = session.start_round(categories(&["a", "b"])).unwrap().clone();
        let appearance = |name: &str| {
            ChoiceAppearance::new(*round.id(), *session.id(), Category::new(name).unwrap(), "", 0)
        };
        let first = appearance("a");
        let clash = appearance("b");

        let mut tx = store.begin().await.unwrap();
        tx.gateway().insert_round(&round).await.unwrap();
        tx.gateway().insert_appearances(&[first]).await.unwrap();
        let err = tx.gateway().insert_appearances(&[clash]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InconsistentRound);
    }

    #[tokio::test]
    async fn sessions_are_listed_newest_first_per_user() {
        let store = InMemoryStore::new();
        let older = committed_session(&store).await;
        let newer = committed_session(&store).await;
        let mut tx = store.begin().await.unwrap();
        tx.gateway()
            .insert_session(&session_for(UserId::new("other").unwrap()))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let ids = tx.gateway().list_session_ids(&user()).await.unwrap();
        assert_eq!(ids, vec![*newer.id(), *older.id()]);
    }

    #[tokio::test]
    async fn fail_point_trips_once() {
        let store = InMemoryStore::new();
        store.fail_next(FailPoint::InsertSession);

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .gateway()
            .insert_session(&session_for(user()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(tx.gateway().insert_session(&session_for(user())).await.is_ok());
    }

    #[tokio::test]
    async fn finished_transaction_rejects_further_use() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.commit().await.unwrap();

        assert!(tx.gateway().load_session(&SessionId::new()).await.is_err());
        assert!(tx.commit().await.is_err());
    }
}
