//! Row tables behind the in-memory store.
//!
//! Rows are stored flat (session headers, round headers, appearances) and
//! assembled into a `Session` tree on load, mirroring the relational schema.

use std::collections::HashMap;

use crate::domain::foundation::{
    AppearanceId, DomainError, ErrorCode, RoundId, RoundStatus, SessionId, StateMachine, UserId,
};
use crate::domain::session::{ChoiceAppearance, Outcome, Round, Session};

/// One committed or staged copy of every table.
#[derive(Debug, Clone, Default)]
pub(super) struct Tables {
    /// Session rows; `rounds` is always empty here.
    sessions: HashMap<SessionId, SessionRow>,
    /// Round rows; `appearances` is always empty here.
    rounds: HashMap<RoundId, Round>,
    appearances: HashMap<AppearanceId, ChoiceAppearance>,
    /// Bumped on every committed change to a session's rows.
    versions: HashMap<SessionId, u64>,
}

#[derive(Debug, Clone)]
struct SessionRow {
    header: Session,
    seq: u64,
}

impl Tables {
    pub(super) fn version_of(&self, id: &SessionId) -> Option<u64> {
        self.versions.get(id).copied()
    }

    pub(super) fn session_exists(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub(super) fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub(super) fn insert_session(
        &mut self,
        session: &Session,
        seq: u64,
    ) -> Result<(), DomainError> {
        if self.sessions.contains_key(session.id()) {
            return Err(DomainError::database(format!(
                "duplicate key: session {}",
                session.id()
            )));
        }
        self.sessions.insert(
            *session.id(),
            SessionRow {
                header: session_header(session),
                seq,
            },
        );
        Ok(())
    }

    pub(super) fn update_session(&mut self, session: &Session) -> Result<(), DomainError> {
        let row = self.sessions.get_mut(session.id()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            )
        })?;
        row.header = session_header(session);
        Ok(())
    }

    pub(super) fn load_session(&self, id: &SessionId) -> Option<Session> {
        let row = self.sessions.get(id)?;
        let header = &row.header;

        let rounds = self
            .rounds
            .values()
            .filter(|r| r.session_id() == id)
            .map(|r| {
                let appearances = self
                    .appearances
                    .values()
                    .filter(|a| a.round_id() == r.id())
                    .cloned()
                    .collect();
                Round::reconstitute(
                    *r.id(),
                    *r.session_id(),
                    r.round_number(),
                    r.status(),
                    r.eligible().to_vec(),
                    appearances,
                )
            })
            .collect();

        Some(Session::reconstitute(
            *header.id(),
            header.user_id().clone(),
            header.base_information().clone(),
            header.status(),
            header.current_round_number(),
            header.final_category().cloned(),
            header.report().cloned(),
            rounds,
            *header.created_at(),
            *header.updated_at(),
        ))
    }

    /// Session IDs owned by `user_id`, newest first.
    pub(super) fn list_session_ids(&self, user_id: &UserId) -> Vec<SessionId> {
        let mut rows: Vec<&SessionRow> = self
            .sessions
            .values()
            .filter(|row| row.header.user_id() == user_id)
            .collect();
        rows.sort_by(|a, b| {
            b.header
                .created_at()
                .cmp(a.header.created_at())
                .then(b.seq.cmp(&a.seq))
        });
        rows.into_iter().map(|row| *row.header.id()).collect()
    }

    pub(super) fn insert_round(&mut self, round: &Round) -> Result<(), DomainError> {
        if !self.sessions.contains_key(round.session_id()) {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", round.session_id()),
            ));
        }
        for existing in self.rounds.values().filter(|r| r.session_id() == round.session_id()) {
            if existing.round_number() == round.round_number() {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("Round {} already exists", round.round_number()),
                ));
            }
            if existing.is_active() && round.is_active() {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("Round {} is still active", existing.round_number()),
                ));
            }
        }

        self.rounds.insert(*round.id(), round_header(round));
        Ok(())
    }

    /// Returns the owning session of the updated round.
    pub(super) fn update_round_status(
        &mut self,
        id: &RoundId,
        status: RoundStatus,
    ) -> Result<SessionId, DomainError> {
        let round = self.rounds.get(id).ok_or_else(|| round_not_found(id))?;
        round.status().transition_to(status)?;

        let updated = Round::reconstitute(
            *round.id(),
            *round.session_id(),
            round.round_number(),
            status,
            round.eligible().to_vec(),
            Vec::new(),
        );
        let session_id = *updated.session_id();
        self.rounds.insert(*id, updated);
        Ok(session_id)
    }

    /// Returns the owning sessions of the inserted appearances.
    pub(super) fn insert_appearances(
        &mut self,
        appearances: &[ChoiceAppearance],
    ) -> Result<Vec<SessionId>, DomainError> {
        let mut sessions = Vec::new();
        for appearance in appearances {
            let round = self
                .rounds
                .get(appearance.round_id())
                .ok_or_else(|| round_not_found(appearance.round_id()))?;
            if round.session_id() != appearance.session_id() {
                return Err(DomainError::new(
                    ErrorCode::InconsistentRound,
                    "Appearance session does not match its round",
                ));
            }

            let clash = self.appearances.values().any(|a| {
                a.round_id() == appearance.round_id()
                    && (a.appearance_index() == appearance.appearance_index()
                        || a.category() == appearance.category())
            });
            if clash || self.appearances.contains_key(appearance.id()) {
                return Err(DomainError::new(
                    ErrorCode::InconsistentRound,
                    format!(
                        "Appearance slot {} ({}) already taken",
                        appearance.appearance_index(),
                        appearance.category()
                    ),
                ));
            }

            self.appearances.insert(*appearance.id(), appearance.clone());
            sessions.push(*appearance.session_id());
        }
        Ok(sessions)
    }

    /// Returns the owning session of the decided appearance.
    pub(super) fn record_outcome(
        &mut self,
        id: &AppearanceId,
        outcome: Outcome,
    ) -> Result<SessionId, DomainError> {
        let appearance = self.appearances.get_mut(id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::AppearanceNotFound,
                format!("Appearance not found: {}", id),
            )
        })?;
        appearance.decide(outcome)?;
        Ok(*appearance.session_id())
    }

    /// Replaces every row of `session_id` with the rows in `staged`.
    pub(super) fn merge_session(&mut self, staged: &Tables, session_id: &SessionId) {
        self.rounds.retain(|_, r| r.session_id() != session_id);
        self.appearances.retain(|_, a| a.session_id() != session_id);

        match staged.sessions.get(session_id) {
            Some(row) => {
                self.sessions.insert(*session_id, row.clone());
            }
            None => {
                self.sessions.remove(session_id);
            }
        }
        for (id, round) in staged.rounds.iter().filter(|(_, r)| r.session_id() == session_id) {
            self.rounds.insert(*id, round.clone());
        }
        for (id, appearance) in staged
            .appearances
            .iter()
            .filter(|(_, a)| a.session_id() == session_id)
        {
            self.appearances.insert(*id, appearance.clone());
        }

        *self.versions.entry(*session_id).or_insert(0) += 1;
    }
}

fn session_header(session: &Session) -> Session {
    Session::reconstitute(
        *session.id(),
        session.user_id().clone(),
        session.base_information().clone(),
        session.status(),
        session.current_round_number(),
        session.final_category().cloned(),
        session.report().cloned(),
        Vec::new(),
        *session.created_at(),
        *session.updated_at(),
    )
}

fn round_header(round: &Round) -> Round {
    Round::reconstitute(
        *round.id(),
        *round.session_id(),
        round.round_number(),
        round.status(),
        round.eligible().to_vec(),
        Vec::new(),
    )
}

fn round_not_found(id: &RoundId) -> DomainError {
    DomainError::new(ErrorCode::RoundNotFound, format!("Round not found: {}", id))
}
