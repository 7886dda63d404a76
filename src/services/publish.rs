//! Lifecycle state machine: draft -> published -> archived.
//!
//! Holds no persistent state of its own; every decision consults the stored
//! session status and the detector's current conflict set. Batch publish is
//! all-or-nothing: statuses change only after every guard has passed, so an
//! interrupted request leaves all sessions at their prior status.

use std::collections::HashSet;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::api::SessionId;
use crate::db::error::{EngineError, EngineResult, ErrorContext};
use crate::db::repository::SessionRepository;
use crate::models::conflict::Conflict;
use crate::models::session::{AuditAction, AuditEntry, ScheduleSession, SessionStatus};
use crate::models::slot::Scope;
use crate::services::conflicts::ConflictDetector;

/// Result of a successful batch publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub sessions: Vec<ScheduleSession>,
    /// Unresolved warning conflicts touching the batch. Surfaced for the
    /// actor's acknowledgment; they never block.
    pub warnings: Vec<Conflict>,
}

pub struct PublishGate {
    repo: Arc<dyn SessionRepository>,
    detector: Arc<ConflictDetector>,
}

impl PublishGate {
    pub fn new(repo: Arc<dyn SessionRepository>, detector: Arc<ConflictDetector>) -> Self {
        Self { repo, detector }
    }

    /// Publish a batch of draft sessions. Every involved scope is rescanned
    /// first; any unresolved blocking conflict touching a batch member fails
    /// the whole batch with `PublishBlocked` and no status changes.
    pub async fn publish(
        &self,
        ids: &[SessionId],
        actor: &str,
    ) -> EngineResult<PublishOutcome> {
        if ids.is_empty() {
            return Err(EngineError::validation_with_context(
                "publish batch must not be empty",
                ErrorContext::new("publish"),
            ));
        }
        let mut batch: Vec<SessionId> = ids.to_vec();
        batch.sort();
        batch.dedup();

        let mut sessions = Vec::with_capacity(batch.len());
        for id in &batch {
            let session = self.repo.fetch_session(*id).await?;
            if session.status != SessionStatus::Draft {
                return Err(EngineError::state(format!(
                    "session {} is {} and cannot be published",
                    id, session.status
                ))
                .with_operation("publish"));
            }
            sessions.push(session);
        }

        let scopes: HashSet<Scope> = sessions.iter().map(|s| s.scope.clone()).collect();
        let members: HashSet<SessionId> = batch.iter().copied().collect();

        let mut blocking = Vec::new();
        let mut warnings = Vec::new();
        for scope in &scopes {
            self.detector.scan(scope).await?;
            blocking.extend(self.detector.unresolved_blocking(scope, &members));
            warnings.extend(self.detector.unresolved_warnings(scope, &members));
        }

        if !blocking.is_empty() {
            return Err(EngineError::publish_blocked(
                format!(
                    "{} unresolved blocking conflict(s) touch the batch",
                    blocking.len()
                ),
                blocking,
            ));
        }

        let published = self
            .repo
            .update_status_many(&batch, SessionStatus::Published, actor)
            .await?;
        for id in &batch {
            self.repo
                .append_audit(AuditEntry::new(*id, AuditAction::Publish, actor))
                .await?;
        }
        info!("published {} session(s) by {}", published.len(), actor);

        Ok(PublishOutcome {
            sessions: published,
            warnings,
        })
    }

    /// Published -> draft, refused while another session holds a completed
    /// assignment link referencing this one.
    pub async fn unpublish(&self, id: SessionId, actor: &str) -> EngineResult<ScheduleSession> {
        let session = self.repo.fetch_session(id).await?;
        self.require_edge(&session, SessionStatus::Draft, "unpublish")?;

        let holders = self.repo.sessions_linking(id).await?;
        if !holders.is_empty() {
            let holder_ids: Vec<String> =
                holders.iter().map(|s| s.id.to_string()).collect();
            return Err(EngineError::State {
                message: format!(
                    "session {} is referenced by completed assignment link(s) and cannot be unpublished",
                    id
                ),
                context: ErrorContext::new("unpublish")
                    .with_entity("session")
                    .with_entity_id(id)
                    .with_details(format!("held by sessions {}", holder_ids.join(", "))),
            });
        }

        let updated = self.apply(id, SessionStatus::Draft, AuditAction::Unpublish, actor).await?;
        self.detector.on_session_changed(&updated.scope, &updated).await?;
        Ok(updated)
    }

    /// Published -> archived. Always allowed from published, irreversible,
    /// and the audit history survives.
    pub async fn archive(&self, id: SessionId, actor: &str) -> EngineResult<ScheduleSession> {
        let session = self.repo.fetch_session(id).await?;
        self.require_edge(&session, SessionStatus::Archived, "archive")?;

        let updated = self.apply(id, SessionStatus::Archived, AuditAction::Archive, actor).await?;
        // Archived sessions leave the active set, so their conflicts clear.
        self.detector.on_session_changed(&updated.scope, &updated).await?;
        Ok(updated)
    }

    /// Generic transition entry point for callers that carry the target
    /// status as data.
    pub async fn transition(
        &self,
        id: SessionId,
        next: SessionStatus,
        actor: &str,
    ) -> EngineResult<ScheduleSession> {
        match next {
            SessionStatus::Published => {
                let outcome = self.publish(&[id], actor).await?;
                Ok(outcome
                    .sessions
                    .into_iter()
                    .next()
                    .ok_or_else(|| EngineError::internal("publish returned no session"))?)
            }
            SessionStatus::Draft => self.unpublish(id, actor).await,
            SessionStatus::Archived => self.archive(id, actor).await,
        }
    }

    fn require_edge(
        &self,
        session: &ScheduleSession,
        next: SessionStatus,
        operation: &str,
    ) -> EngineResult<()> {
        if !session.status.can_transition_to(next) {
            return Err(EngineError::State {
                message: format!(
                    "session {} cannot go from {} to {}",
                    session.id, session.status, next
                ),
                context: ErrorContext::new(operation)
                    .with_entity("session")
                    .with_entity_id(session.id),
            });
        }
        Ok(())
    }

    async fn apply(
        &self,
        id: SessionId,
        next: SessionStatus,
        action: AuditAction,
        actor: &str,
    ) -> EngineResult<ScheduleSession> {
        let mut updated = self
            .repo
            .update_status_many(&[id], next, actor)
            .await?;
        self.repo
            .append_audit(AuditEntry::new(id, action, actor))
            .await?;
        info!("session {} -> {} by {}", id, next, actor);
        updated
            .pop()
            .ok_or_else(|| EngineError::internal("status update returned no session"))
    }
}
