//! Session store: the mutation path for scheduled sessions.
//!
//! Every mutation validates first, writes through the repository, appends an
//! audit entry in the same call path (no hidden triggers), and notifies the
//! conflict detector of the affected scope for incremental recomputation.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use log::debug;

use crate::api::{AssignmentId, SessionId};
use crate::db::error::{EngineError, EngineResult, ErrorContext};
use crate::db::repository::SessionRepository;
use crate::models::session::{
    AuditAction, AuditEntry, ScheduleSession, SessionDraft, SessionPatch, SessionStatus,
};
use crate::services::conflicts::ConflictDetector;

/// Owner of `ScheduleSession` and `AuditEntry` records.
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
    detector: Arc<ConflictDetector>,
}

impl SessionStore {
    pub fn new(repo: Arc<dyn SessionRepository>, detector: Arc<ConflictDetector>) -> Self {
        Self { repo, detector }
    }

    /// Create a session from a validated draft. Status starts at `draft`.
    pub async fn create(&self, draft: SessionDraft, actor: &str) -> EngineResult<ScheduleSession> {
        draft.validate().map_err(|msg| {
            EngineError::validation_with_context(
                msg,
                ErrorContext::new("create_session").with_entity("session"),
            )
        })?;

        let now = Utc::now();
        let session = ScheduleSession {
            id: SessionId::new(0), // assigned by the repository
            day: draft.date.weekday(),
            subject: draft.subject,
            faculty_email: draft.faculty_email,
            room: draft.room,
            date: draft.date,
            slot: draft.slot,
            units: draft.units,
            kind: draft.kind,
            assignment: draft.assignment,
            scope: draft.scope,
            cohort: draft.cohort,
            status: SessionStatus::Draft,
            deleted: false,
            created_by: actor.to_string(),
            created_at: now,
            updated_by: actor.to_string(),
            updated_at: now,
        };

        let stored = self.repo.insert_session(session).await?;
        self.repo
            .append_audit(AuditEntry::new(stored.id, AuditAction::Create, actor))
            .await?;
        debug!("created session {} in scope {}", stored.id, stored.scope);

        self.detector
            .on_session_changed(&stored.scope, &stored)
            .await?;
        Ok(stored)
    }

    /// Apply a partial update under the optimistic-concurrency check.
    pub async fn update(
        &self,
        id: SessionId,
        patch: SessionPatch,
        actor: &str,
    ) -> EngineResult<ScheduleSession> {
        let current = self.repo.fetch_session(id).await?;

        if current.status == SessionStatus::Archived {
            return Err(EngineError::state(format!(
                "session {} is archived and can no longer be edited",
                id
            )));
        }
        if current.updated_at != patch.expected_updated_at {
            return Err(EngineError::Concurrency {
                message: format!(
                    "session {} was modified at {}; caller expected {}",
                    id, current.updated_at, patch.expected_updated_at
                ),
                context: ErrorContext::new("update_session")
                    .with_entity("session")
                    .with_entity_id(id)
                    .retryable(),
            });
        }

        let previous_scope = current.scope.clone();
        let mut next = current;
        if let Some(subject) = patch.subject {
            next.subject = subject;
        }
        if let Some(faculty_email) = patch.faculty_email {
            next.faculty_email = faculty_email;
        }
        if let Some(room) = patch.room {
            next.room = room;
        }
        if let Some(date) = patch.date {
            next.date = date;
            next.day = date.weekday();
        }
        if let Some(slot) = patch.slot {
            next.slot = slot;
        }
        if let Some(units) = patch.units {
            next.units = units;
        }
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(assignment) = patch.assignment {
            next.assignment = assignment;
        }

        // Revalidate invariants over the merged row.
        let revalidate = SessionDraft {
            subject: next.subject.clone(),
            faculty_email: next.faculty_email.clone(),
            room: next.room.clone(),
            date: next.date,
            slot: next.slot,
            units: next.units,
            kind: next.kind,
            assignment: next.assignment.clone(),
            scope: next.scope.clone(),
            cohort: next.cohort.clone(),
        };
        revalidate.validate().map_err(|msg| {
            EngineError::validation_with_context(
                msg,
                ErrorContext::new("update_session")
                    .with_entity("session")
                    .with_entity_id(id),
            )
        })?;

        next.updated_by = actor.to_string();
        next.updated_at = Utc::now();

        self.repo.store_session(next.clone()).await?;
        self.repo
            .append_audit(AuditEntry::new(id, AuditAction::Update, actor))
            .await?;

        self.detector.on_session_changed(&next.scope, &next).await?;
        if previous_scope != next.scope {
            self.detector
                .on_session_changed(&previous_scope, &next)
                .await?;
        }
        Ok(next)
    }

    /// Soft-delete a session. Published sessions must be archived instead,
    /// preserving history.
    pub async fn delete(&self, id: SessionId, actor: &str) -> EngineResult<()> {
        let mut session = self.repo.fetch_session(id).await?;
        if session.status == SessionStatus::Published {
            return Err(EngineError::state(format!(
                "session {} is published; archive it instead of deleting",
                id
            )));
        }

        session.deleted = true;
        session.updated_by = actor.to_string();
        session.updated_at = Utc::now();
        self.repo.store_session(session.clone()).await?;
        self.repo
            .append_audit(AuditEntry::new(id, AuditAction::Delete, actor))
            .await?;

        self.detector
            .on_session_changed(&session.scope, &session)
            .await?;
        Ok(())
    }

    /// React to deletion of an external assignment: null the link on every
    /// referencing session. Never cascades into session deletion.
    pub async fn detach_assignment(
        &self,
        assignment: AssignmentId,
        actor: &str,
    ) -> EngineResult<usize> {
        let affected = self.repo.sessions_with_assignment(assignment).await?;
        let count = affected.len();
        for mut session in affected {
            session.assignment = None;
            session.updated_by = actor.to_string();
            session.updated_at = Utc::now();
            let id = session.id;
            self.repo.store_session(session).await?;
            self.repo
                .append_audit(AuditEntry::new(id, AuditAction::Update, actor))
                .await?;
        }
        Ok(count)
    }

    /// Fetch a session (including archived ones).
    pub async fn get(&self, id: SessionId) -> EngineResult<ScheduleSession> {
        self.repo.fetch_session(id).await
    }

    /// Chronological audit trail for a session. Survives archival and soft
    /// deletion.
    pub async fn audit_trail(&self, id: SessionId) -> EngineResult<Vec<AuditEntry>> {
        let entries = self.repo.audit_trail(id).await?;
        if entries.is_empty() {
            // A session always has at least its create entry, so an empty
            // trail means the id was never issued.
            self.repo.fetch_session(id).await?;
        }
        Ok(entries)
    }

    pub fn repository(&self) -> &Arc<dyn SessionRepository> {
        &self.repo
    }
}
