//! Scheduled teaching sessions, their lifecycle, and the audit trail.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{AssignmentId, SessionId, SubjectId};
use crate::models::slot::{CohortScope, Scope, SlotSignature, UnitBreakdown};

/// Lifecycle state of a session. Transitions are monotonic: a draft may be
/// published, a published session may be unpublished or archived, and
/// archived is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Draft,
    Published,
    Archived,
}

impl SessionStatus {
    /// Whether the state machine admits the given edge. Publish gating
    /// (conflict checks, link guards) is enforced separately; this is the
    /// raw shape of the machine.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Draft, SessionStatus::Published)
                | (SessionStatus::Published, SessionStatus::Draft)
                | (SessionStatus::Published, SessionStatus::Archived)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Draft => "draft",
            SessionStatus::Published => "published",
            SessionStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of teaching occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Regular,
    Makeup,
    Extra,
}

impl Default for SessionKind {
    fn default() -> Self {
        SessionKind::Regular
    }
}

/// Reference to an external assignment record. Display/linkage only: deleting
/// the assignment on the other side nulls this link, never the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentLink {
    pub assignment_id: AssignmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Session that hosts the completed deliverable, if any. A published
    /// session referenced this way cannot be unpublished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_session: Option<SessionId>,
    #[serde(default)]
    pub completed: bool,
}

/// One scheduled teaching occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSession {
    pub id: SessionId,
    pub subject: SubjectId,
    /// Assigned faculty member, identified by institutional email.
    pub faculty_email: String,
    /// Physical room code, when room allocation is tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// Calendar date of the occurrence.
    pub date: NaiveDate,
    /// Day of week, cached from `date`. Must agree with `slot.day`.
    pub day: Weekday,
    pub slot: SlotSignature,
    pub units: UnitBreakdown,
    #[serde(default)]
    pub kind: SessionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<AssignmentLink>,
    pub scope: Scope,
    pub cohort: CohortScope,
    pub status: SessionStatus,
    /// Soft-delete marker. Deleted sessions are invisible to queries but the
    /// audit trail survives.
    #[serde(default)]
    pub deleted: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    /// Optimistic-concurrency token: callers must echo this back on update.
    pub updated_at: DateTime<Utc>,
}

impl ScheduleSession {
    /// Whether the session participates in conflict detection and
    /// distribution sums: not deleted and not archived.
    pub fn is_active(&self) -> bool {
        !self.deleted && self.status != SessionStatus::Archived
    }

    /// The canonical overlap test: same calendar date and intersecting
    /// period ranges.
    pub fn overlaps(&self, other: &ScheduleSession) -> bool {
        self.date == other.date && self.slot.overlaps(&other.slot)
    }
}

/// Input for creating a session. The store validates invariants, assigns the
/// identifier and audit fields, and sets status to draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDraft {
    pub subject: SubjectId,
    pub faculty_email: String,
    #[serde(default)]
    pub room: Option<String>,
    pub date: NaiveDate,
    pub slot: SlotSignature,
    pub units: UnitBreakdown,
    #[serde(default)]
    pub kind: SessionKind,
    #[serde(default)]
    pub assignment: Option<AssignmentLink>,
    pub scope: Scope,
    pub cohort: CohortScope,
}

impl SessionDraft {
    /// Check the structural invariants: span >= 1, a valid start period, at
    /// least one unit-type count, a faculty email, and agreement between the
    /// calendar date and the slot signature's day.
    pub fn validate(&self) -> Result<(), String> {
        if self.slot.span < 1 {
            return Err("slot span must be at least 1 period".to_string());
        }
        if self.slot.start_period < 1 {
            return Err("slot start period must be 1-based".to_string());
        }
        if self.units.is_empty() {
            return Err("at least one instructional unit count must be > 0".to_string());
        }
        if self.faculty_email.trim().is_empty() {
            return Err("faculty email must not be empty".to_string());
        }
        if self.date.weekday() != self.slot.day {
            return Err(format!(
                "date {} falls on {:?} but slot signature says {:?}",
                self.date,
                self.date.weekday(),
                self.slot.day
            ));
        }
        Ok(())
    }
}

/// Partial update for a session. Unset fields are left unchanged.
/// `expected_updated_at` carries the caller's optimistic-concurrency token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(default)]
    pub subject: Option<SubjectId>,
    #[serde(default)]
    pub faculty_email: Option<String>,
    /// `Some(None)` clears the room, `Some(Some(..))` replaces it.
    #[serde(default, with = "double_option")]
    pub room: Option<Option<String>>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub slot: Option<SlotSignature>,
    #[serde(default)]
    pub units: Option<UnitBreakdown>,
    #[serde(default)]
    pub kind: Option<SessionKind>,
    #[serde(default, with = "double_option")]
    pub assignment: Option<Option<AssignmentLink>>,
    pub expected_updated_at: DateTime<Utc>,
}

mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Audited action on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Publish,
    Unpublish,
    Archive,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Publish => "publish",
            AuditAction::Unpublish => "unpublish",
            AuditAction::Archive => "archive",
        }
    }
}

/// Immutable audit record. Append-only: never mutated or deleted, and it
/// outlives archival of the session it describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub session_id: SessionId,
    pub action: AuditAction,
    pub actor: String,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(session_id: SessionId, action: AuditAction, actor: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            action,
            actor: actor.into(),
            at: Utc::now(),
        }
    }
}
