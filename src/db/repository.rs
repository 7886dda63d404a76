//! Repository traits: the storage seam of the engine.
//!
//! `SessionRepository` is the single writer of truth for sessions and the
//! append-only audit log. `QuotaSource` and `AffiliationSource` are the
//! narrow read-only interfaces to the external catalog systems; they are
//! traits so tests can inject fixtures and so real backends can be swapped in
//! without touching the services.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::{AssignmentId, SessionId, SubjectId};
use crate::db::error::EngineResult;
use crate::models::session::{AuditEntry, ScheduleSession, SessionStatus};
use crate::models::slot::{Scope, UnitBreakdown};

/// Durable storage for sessions and their audit trail.
///
/// Listing methods return *active* sessions only (not deleted, not archived)
/// since those are the ones that participate in conflict detection and
/// distribution sums. `fetch_session` also returns archived sessions so the
/// lifecycle surface can inspect them.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session, assigning its identifier. The input's `id`
    /// field is ignored.
    async fn insert_session(&self, session: ScheduleSession) -> EngineResult<ScheduleSession>;

    /// Fetch a session by id. Soft-deleted sessions are `NotFound`.
    async fn fetch_session(&self, id: SessionId) -> EngineResult<ScheduleSession>;

    /// Replace a stored session row. The caller has already performed the
    /// concurrency and invariant checks.
    async fn store_session(&self, session: ScheduleSession) -> EngineResult<()>;

    /// Set the status of every listed session in one atomic step, stamping
    /// the update actor and timestamp. Fails without side effect if any id
    /// is unknown.
    async fn update_status_many(
        &self,
        ids: &[SessionId],
        status: SessionStatus,
        actor: &str,
    ) -> EngineResult<Vec<ScheduleSession>>;

    /// All active sessions within a detection scope.
    async fn list_scope(&self, scope: &Scope) -> EngineResult<Vec<ScheduleSession>>;

    /// All active sessions for a subject in a term, across scopes.
    async fn list_subject_term(
        &self,
        subject: &SubjectId,
        term: u8,
    ) -> EngineResult<Vec<ScheduleSession>>;

    /// All active sessions taught by a faculty member on a date, across
    /// scopes (bridge detection relies on the cross-scope reach).
    async fn list_faculty_date(
        &self,
        faculty_email: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<ScheduleSession>>;

    /// All active sessions taught by a faculty member in an ISO week.
    async fn list_faculty_week(
        &self,
        faculty_email: &str,
        week_year: i32,
        week: u32,
    ) -> EngineResult<Vec<ScheduleSession>>;

    /// All active sessions booked into a room on a date, across scopes.
    async fn list_room_date(
        &self,
        room: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<ScheduleSession>>;

    /// Sessions holding a completed assignment link that references the
    /// given session. Non-empty means the session cannot be unpublished.
    async fn sessions_linking(&self, id: SessionId) -> EngineResult<Vec<ScheduleSession>>;

    /// Sessions whose assignment link points at the given external
    /// assignment record.
    async fn sessions_with_assignment(
        &self,
        assignment: AssignmentId,
    ) -> EngineResult<Vec<ScheduleSession>>;

    /// Append an audit entry. The log is append-only; there is no update or
    /// delete counterpart by design of the data model.
    async fn append_audit(&self, entry: AuditEntry) -> EngineResult<()>;

    /// Chronological audit trail for a session, including entries for
    /// deleted and archived sessions.
    async fn audit_trail(&self, id: SessionId) -> EngineResult<Vec<AuditEntry>>;

    /// Backend liveness probe.
    async fn health_check(&self) -> EngineResult<bool>;
}

/// Planned per-subject instructional-unit quotas, per term.
#[async_trait]
pub trait QuotaSource: Send + Sync {
    /// Planned units for a subject in a term. `Ok(None)` means no quota is
    /// defined, which callers treat as "skip" (scan) or `NotFound`
    /// (reconcile) depending on context.
    async fn planned_units(
        &self,
        subject: &SubjectId,
        term: u8,
    ) -> EngineResult<Option<UnitBreakdown>>;
}

/// Faculty affiliation data: maximum weekly load ceilings.
#[async_trait]
pub trait AffiliationSource: Send + Sync {
    /// Maximum weekly unit-hours for a faculty member, if affiliation data
    /// exists. `Ok(None)` degrades the load check rather than failing it.
    async fn max_weekly_units(&self, faculty_email: &str) -> EngineResult<Option<u16>>;
}
