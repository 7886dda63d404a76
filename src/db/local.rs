//! In-memory repository backend.
//!
//! Single-process storage for unit testing and local deployments. All tables
//! live behind one `parking_lot::RwLock`, so every mutating call is a single
//! critical section and batch status updates are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::api::{AssignmentId, SessionId, SubjectId};
use crate::db::error::{EngineError, EngineResult, ErrorContext};
use crate::db::repository::{AffiliationSource, QuotaSource, SessionRepository};
use crate::models::session::{AuditEntry, ScheduleSession, SessionStatus};
use crate::models::slot::{Scope, UnitBreakdown};

#[derive(Default)]
struct Tables {
    sessions: HashMap<SessionId, ScheduleSession>,
    audit: Vec<AuditEntry>,
    next_id: i64,
}

/// In-memory implementation of [`SessionRepository`].
pub struct LocalRepository {
    tables: RwLock<Tables>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    fn not_found(id: SessionId) -> EngineError {
        EngineError::not_found_with_context(
            format!("session {} does not exist", id),
            ErrorContext::default()
                .with_entity("session")
                .with_entity_id(id),
        )
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn active(session: &ScheduleSession) -> bool {
    session.is_active()
}

#[async_trait]
impl SessionRepository for LocalRepository {
    async fn insert_session(&self, mut session: ScheduleSession) -> EngineResult<ScheduleSession> {
        let mut tables = self.tables.write();
        session.id = SessionId::new(tables.next_id);
        tables.next_id += 1;
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn fetch_session(&self, id: SessionId) -> EngineResult<ScheduleSession> {
        let tables = self.tables.read();
        tables
            .sessions
            .get(&id)
            .filter(|s| !s.deleted)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn store_session(&self, session: ScheduleSession) -> EngineResult<()> {
        let mut tables = self.tables.write();
        if !tables.sessions.contains_key(&session.id) {
            return Err(Self::not_found(session.id));
        }
        tables.sessions.insert(session.id, session);
        Ok(())
    }

    async fn update_status_many(
        &self,
        ids: &[SessionId],
        status: SessionStatus,
        actor: &str,
    ) -> EngineResult<Vec<ScheduleSession>> {
        let mut tables = self.tables.write();
        // Validate the whole batch before touching any row.
        for id in ids {
            if !tables.sessions.get(id).map(|s| !s.deleted).unwrap_or(false) {
                return Err(Self::not_found(*id));
            }
        }
        let now = Utc::now();
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            let session = tables.sessions.get_mut(id).expect("validated above");
            session.status = status;
            session.updated_by = actor.to_string();
            session.updated_at = now;
            updated.push(session.clone());
        }
        Ok(updated)
    }

    async fn list_scope(&self, scope: &Scope) -> EngineResult<Vec<ScheduleSession>> {
        let tables = self.tables.read();
        let mut out: Vec<_> = tables
            .sessions
            .values()
            .filter(|s| active(s) && &s.scope == scope)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.id);
        Ok(out)
    }

    async fn list_subject_term(
        &self,
        subject: &SubjectId,
        term: u8,
    ) -> EngineResult<Vec<ScheduleSession>> {
        let tables = self.tables.read();
        let mut out: Vec<_> = tables
            .sessions
            .values()
            .filter(|s| active(s) && &s.subject == subject && s.scope.term == term)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.id);
        Ok(out)
    }

    async fn list_faculty_date(
        &self,
        faculty_email: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<ScheduleSession>> {
        let tables = self.tables.read();
        let mut out: Vec<_> = tables
            .sessions
            .values()
            .filter(|s| active(s) && s.faculty_email == faculty_email && s.date == date)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.id);
        Ok(out)
    }

    async fn list_faculty_week(
        &self,
        faculty_email: &str,
        week_year: i32,
        week: u32,
    ) -> EngineResult<Vec<ScheduleSession>> {
        let tables = self.tables.read();
        let mut out: Vec<_> = tables
            .sessions
            .values()
            .filter(|s| {
                active(s) && s.faculty_email == faculty_email && {
                    let iso = s.date.iso_week();
                    iso.year() == week_year && iso.week() == week
                }
            })
            .cloned()
            .collect();
        out.sort_by_key(|s| s.id);
        Ok(out)
    }

    async fn list_room_date(
        &self,
        room: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<ScheduleSession>> {
        let tables = self.tables.read();
        let mut out: Vec<_> = tables
            .sessions
            .values()
            .filter(|s| active(s) && s.room.as_deref() == Some(room) && s.date == date)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.id);
        Ok(out)
    }

    async fn sessions_linking(&self, id: SessionId) -> EngineResult<Vec<ScheduleSession>> {
        let tables = self.tables.read();
        let mut out: Vec<_> = tables
            .sessions
            .values()
            .filter(|s| {
                !s.deleted
                    && s.id != id
                    && s.assignment
                        .as_ref()
                        .map(|a| a.completed && a.linked_session == Some(id))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        out.sort_by_key(|s| s.id);
        Ok(out)
    }

    async fn sessions_with_assignment(
        &self,
        assignment: AssignmentId,
    ) -> EngineResult<Vec<ScheduleSession>> {
        let tables = self.tables.read();
        let mut out: Vec<_> = tables
            .sessions
            .values()
            .filter(|s| {
                !s.deleted
                    && s.assignment
                        .as_ref()
                        .map(|a| a.assignment_id == assignment)
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        out.sort_by_key(|s| s.id);
        Ok(out)
    }

    async fn append_audit(&self, entry: AuditEntry) -> EngineResult<()> {
        self.tables.write().audit.push(entry);
        Ok(())
    }

    async fn audit_trail(&self, id: SessionId) -> EngineResult<Vec<AuditEntry>> {
        let tables = self.tables.read();
        let mut out: Vec<_> = tables
            .audit
            .iter()
            .filter(|entry| entry.session_id == id)
            .cloned()
            .collect();
        out.sort_by_key(|entry| entry.at);
        Ok(out)
    }

    async fn health_check(&self) -> EngineResult<bool> {
        Ok(true)
    }
}

/// In-memory quota fixture: the weekly-distribution quotas normally served by
/// the curriculum system.
#[derive(Default)]
pub struct InMemoryQuotas {
    quotas: RwLock<HashMap<(SubjectId, u8), UnitBreakdown>>,
}

impl InMemoryQuotas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, subject: SubjectId, term: u8, planned: UnitBreakdown) {
        self.quotas.write().insert((subject, term), planned);
    }

    pub fn remove(&self, subject: &SubjectId, term: u8) {
        self.quotas.write().remove(&(subject.clone(), term));
    }
}

#[async_trait]
impl QuotaSource for InMemoryQuotas {
    async fn planned_units(
        &self,
        subject: &SubjectId,
        term: u8,
    ) -> EngineResult<Option<UnitBreakdown>> {
        Ok(self.quotas.read().get(&(subject.clone(), term)).copied())
    }
}

/// In-memory affiliation fixture: maximum weekly load ceilings per faculty
/// member.
#[derive(Default)]
pub struct InMemoryAffiliations {
    ceilings: RwLock<HashMap<String, u16>>,
}

impl InMemoryAffiliations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, faculty_email: impl Into<String>, max_weekly_units: u16) {
        self.ceilings
            .write()
            .insert(faculty_email.into(), max_weekly_units);
    }
}

#[async_trait]
impl AffiliationSource for InMemoryAffiliations {
    async fn max_weekly_units(&self, faculty_email: &str) -> EngineResult<Option<u16>> {
        Ok(self.ceilings.read().get(faculty_email).copied())
    }
}
