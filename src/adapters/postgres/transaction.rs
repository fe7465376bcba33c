//! PostgreSQL transaction manager and store gateway.
//!
//! Each unit of work owns one `sqlx` transaction. Dropping it without a
//! commit rolls back, which is what a cancelled request relies on.

use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row};
use std::collections::HashMap;
use uuid::Uuid;

use super::rows::{
    category_names, db_error, is_unique_violation, row_to_appearance, row_to_round,
    row_to_session, to_db_int, SESSION_COLUMNS,
};
use crate::domain::foundation::{
    AppearanceId, DomainError, ErrorCode, RoundId, RoundStatus, SessionId, StateMachine, UserId,
};
use crate::domain::session::{ChoiceAppearance, Outcome, Round, Session};
use crate::ports::{StoreGateway, Transaction, TransactionManager};

/// Opens PostgreSQL transactions from a pool.
#[derive(Clone)]
pub struct PostgresTransactionManager {
    pool: PgPool,
}

impl PostgresTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PostgresTransactionManager {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;
        Ok(Box::new(PostgresTransaction { tx: Some(tx) }))
    }
}

/// One open PostgreSQL transaction.
pub struct PostgresTransaction {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PostgresTransaction {
    fn conn(&mut self) -> Result<&mut PgConnection, DomainError> {
        self.tx.as_deref_mut().ok_or_else(|| {
            DomainError::new(ErrorCode::DatabaseError, "Transaction already finished")
        })
    }

    async fn load(&mut self, id: &SessionId, lock: bool) -> Result<Option<Session>, DomainError> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE id = $1{}",
            SESSION_COLUMNS,
            if lock { " FOR UPDATE" } else { "" }
        );
        let Some(session_row) = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.conn()?)
            .await
            .map_err(db_error("Failed to fetch session"))?
        else {
            return Ok(None);
        };

        let appearance_rows = sqlx::query(
            r#"
            SELECT id, round_id, session_id, category, description, appearance_index, is_winner
            FROM choice_appearances
            WHERE session_id = $1
            ORDER BY appearance_index
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(self.conn()?)
        .await
        .map_err(db_error("Failed to fetch appearances"))?;

        let mut by_round: HashMap<RoundId, Vec<ChoiceAppearance>> = HashMap::new();
        for row in &appearance_rows {
            let appearance = row_to_appearance(row)?;
            by_round
                .entry(*appearance.round_id())
                .or_default()
                .push(appearance);
        }

        let round_rows = sqlx::query(
            r#"
            SELECT id, session_id, round_number, status, eligible_categories
            FROM rounds
            WHERE session_id = $1
            ORDER BY round_number
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(self.conn()?)
        .await
        .map_err(db_error("Failed to fetch rounds"))?;

        let mut rounds = Vec::with_capacity(round_rows.len());
        for row in &round_rows {
            let round_id = RoundId::from_uuid(
                row.try_get::<Uuid, _>("id")
                    .map_err(db_error("Failed to read round id"))?,
            );
            let appearances = by_round.remove(&round_id).unwrap_or_default();
            rounds.push(row_to_round(row, appearances)?);
        }

        row_to_session(&session_row, rounds).map(Some)
    }
}

#[async_trait]
impl StoreGateway for PostgresTransaction {
    async fn insert_session(&mut self, session: &Session) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, user_id, base_information, status, current_round_number,
                final_category, report, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.user_id().as_str())
        .bind(Json(session.base_information()))
        .bind(session.status().as_str())
        .bind(to_db_int("current_round_number", session.current_round_number())?)
        .bind(session.final_category().map(|c| c.as_str()))
        .bind(session.report().map(Json))
        .bind(session.created_at().as_datetime())
        .bind(session.updated_at().as_datetime())
        .execute(self.conn()?)
        .await
        .map_err(db_error("Failed to insert session"))?;

        Ok(())
    }

    async fn load_session(&mut self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        self.load(id, false).await
    }

    async fn load_session_for_update(
        &mut self,
        id: &SessionId,
    ) -> Result<Option<Session>, DomainError> {
        self.load(id, true).await
    }

    async fn list_session_ids(&mut self, user_id: &UserId) -> Result<Vec<SessionId>, DomainError> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM sessions WHERE user_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(user_id.as_str())
        .fetch_all(self.conn()?)
        .await
        .map_err(db_error("Failed to list sessions"))?;

        Ok(ids.into_iter().map(|(id,)| SessionId::from_uuid(id)).collect())
    }

    async fn update_session(&mut self, session: &Session) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                status = $2,
                current_round_number = $3,
                final_category = $4,
                report = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.status().as_str())
        .bind(to_db_int("current_round_number", session.current_round_number())?)
        .bind(session.final_category().map(|c| c.as_str()))
        .bind(session.report().map(Json))
        .bind(session.updated_at().as_datetime())
        .execute(self.conn()?)
        .await
        .map_err(db_error("Failed to update session"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            ));
        }
        Ok(())
    }

    async fn insert_round(&mut self, round: &Round) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO rounds (id, session_id, round_number, status, eligible_categories)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(round.id().as_uuid())
        .bind(round.session_id().as_uuid())
        .bind(to_db_int("round_number", round.round_number())?)
        .bind(round.status().as_str())
        .bind(category_names(round.eligible()))
        .execute(self.conn()?)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!(
                        "Round {} conflicts with an existing or active round",
                        round.round_number()
                    ),
                )
            } else {
                db_error("Failed to insert round")(e)
            }
        })?;

        Ok(())
    }

    async fn update_round_status(
        &mut self,
        id: &RoundId,
        status: RoundStatus,
    ) -> Result<(), DomainError> {
        let current: Option<(String,)> =
            sqlx::query_as("SELECT status FROM rounds WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(self.conn()?)
                .await
                .map_err(db_error("Failed to fetch round"))?;
        let Some((current,)) = current else {
            return Err(DomainError::new(
                ErrorCode::RoundNotFound,
                format!("Round not found: {}", id),
            ));
        };
        let current: RoundStatus = current.parse()?;
        current.transition_to(status)?;

        sqlx::query("UPDATE rounds SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(self.conn()?)
            .await
            .map_err(db_error("Failed to update round"))?;

        Ok(())
    }

    async fn insert_appearances(
        &mut self,
        appearances: &[ChoiceAppearance],
    ) -> Result<(), DomainError> {
        for appearance in appearances {
            sqlx::query(
                r#"
                INSERT INTO choice_appearances (
                    id, round_id, session_id, category, description, appearance_index, is_winner
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(appearance.id().as_uuid())
            .bind(appearance.round_id().as_uuid())
            .bind(appearance.session_id().as_uuid())
            .bind(appearance.category().as_str())
            .bind(appearance.description())
            .bind(to_db_int("appearance_index", appearance.appearance_index())?)
            .bind(appearance.outcome().as_flag())
            .execute(self.conn()?)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::new(
                        ErrorCode::InconsistentRound,
                        format!(
                            "Slot {} or category '{}' already taken in round {}",
                            appearance.appearance_index(),
                            appearance.category(),
                            appearance.round_id()
                        ),
                    )
                } else {
                    db_error("Failed to insert appearance")(e)
                }
            })?;
        }
        Ok(())
    }

    async fn record_outcome(
        &mut self,
        id: &AppearanceId,
        outcome: Outcome,
    ) -> Result<(), DomainError> {
        let Some(flag) = outcome.as_flag() else {
            return Err(DomainError::validation(
                "outcome",
                "An outcome must be winner or loser",
            ));
        };

        let result = sqlx::query(
            "UPDATE choice_appearances SET is_winner = $2 WHERE id = $1 AND is_winner IS NULL",
        )
        .bind(id.as_uuid())
        .bind(flag)
        .execute(self.conn()?)
        .await
        .map_err(db_error("Failed to record outcome"))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM choice_appearances WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(self.conn()?)
                .await
                .map_err(db_error("Failed to fetch appearance"))?;
        Err(match exists {
            Some(_) => DomainError::new(
                ErrorCode::OutcomeAlreadyDecided,
                format!("Appearance {} already has an outcome", id),
            ),
            None => DomainError::new(
                ErrorCode::AppearanceNotFound,
                format!("Appearance not found: {}", id),
            ),
        })
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    fn gateway(&mut self) -> &mut dyn StoreGateway {
        self
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        match self.tx.take() {
            Some(tx) => tx.commit().await.map_err(db_error("Failed to commit")),
            None => Ok(()),
        }
    }

    async fn rollback(&mut self) -> Result<(), DomainError> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await.map_err(db_error("Failed to roll back")),
            None => Ok(()),
        }
    }
}
