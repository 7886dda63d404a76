//! Typed conflict records produced by the detector.
//!
//! A conflict is derived data: uniquely identified by its type and sorted
//! participant set, rebuildable at any time, and never hand-edited except for
//! the `resolved` flag.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::api::{SessionId, SubjectId};
use crate::models::slot::{CohortScope, Scope, UnitType};

/// Conflict severity. Ordering is ascending: blocking sorts greatest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Blocking,
}

/// Discriminant of the closed set of conflict types. The declaration order is
/// the reporting order used inside a severity band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Faculty,
    Division,
    Room,
    Overconsumption,
    Bridge,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::Faculty => "faculty",
            ConflictType::Division => "division",
            ConflictType::Room => "room",
            ConflictType::Overconsumption => "overconsumption",
            ConflictType::Bridge => "bridge",
        }
    }
}

/// The shared resource a bridge conflict correlates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum BridgeResource {
    Faculty(String),
    Room(String),
}

/// The date/period window two sessions collide in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapWindow {
    pub date: NaiveDate,
    /// First shared period (1-based).
    pub start_period: u8,
    /// One past the last shared period.
    pub end_period: u8,
}

/// Type-specific conflict payload. Each variant carries only the fields that
/// exist for that conflict type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ConflictDetail {
    Faculty {
        faculty_email: String,
        window: OverlapWindow,
    },
    Division {
        cohort: CohortScope,
        window: OverlapWindow,
    },
    Room {
        room: String,
        window: OverlapWindow,
    },
    Overconsumption {
        subject: SubjectId,
        unit_type: UnitType,
        planned: u16,
        scheduled: u32,
    },
    Bridge {
        resource: BridgeResource,
        /// The other timetable scope involved.
        other_scope: Scope,
        window: OverlapWindow,
    },
}

impl ConflictDetail {
    pub fn conflict_type(&self) -> ConflictType {
        match self {
            ConflictDetail::Faculty { .. } => ConflictType::Faculty,
            ConflictDetail::Division { .. } => ConflictType::Division,
            ConflictDetail::Room { .. } => ConflictType::Room,
            ConflictDetail::Overconsumption { .. } => ConflictType::Overconsumption,
            ConflictDetail::Bridge { .. } => ConflictType::Bridge,
        }
    }
}

/// Identity of a conflict: type plus the sorted, deduplicated participant
/// set. Rescans keyed this way can never produce duplicates for the same
/// underlying cause.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConflictKey {
    pub conflict_type: ConflictType,
    pub participants: Vec<SessionId>,
}

impl ConflictKey {
    pub fn new(conflict_type: ConflictType, mut participants: Vec<SessionId>) -> Self {
        participants.sort();
        participants.dedup();
        Self {
            conflict_type,
            participants,
        }
    }

    /// Stable hash of the participant set, used as the persisted cache key
    /// component alongside scope and type.
    pub fn participant_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.conflict_type.as_str().as_bytes());
        for id in &self.participants {
            hasher.update(id.value().to_be_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// A detected inconsistency between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub conflict_type: ConflictType,
    pub severity: Severity,
    /// Sorted identifiers of every session involved.
    pub session_ids: Vec<SessionId>,
    pub message: String,
    /// Faculty emails implicated, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faculty_emails: Vec<String>,
    /// Student cohorts implicated, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cohorts: Vec<CohortScope>,
    pub detail: ConflictDetail,
    pub resolved: bool,
    pub auto_resolvable: bool,
    pub detected_at: DateTime<Utc>,
}

impl Conflict {
    pub fn new(
        severity: Severity,
        participants: Vec<SessionId>,
        message: impl Into<String>,
        detail: ConflictDetail,
        auto_resolvable: bool,
    ) -> Self {
        let key = ConflictKey::new(detail.conflict_type(), participants);
        Self {
            conflict_type: key.conflict_type,
            severity,
            session_ids: key.participants,
            message: message.into(),
            faculty_emails: Vec::new(),
            cohorts: Vec::new(),
            detail,
            resolved: false,
            auto_resolvable,
            detected_at: Utc::now(),
        }
    }

    pub fn with_faculty(mut self, emails: Vec<String>) -> Self {
        self.faculty_emails = emails;
        self.faculty_emails.sort();
        self.faculty_emails.dedup();
        self
    }

    pub fn with_cohorts(mut self, cohorts: Vec<CohortScope>) -> Self {
        self.cohorts = cohorts;
        self.cohorts.sort();
        self.cohorts.dedup();
        self
    }

    pub fn key(&self) -> ConflictKey {
        ConflictKey::new(self.conflict_type, self.session_ids.clone())
    }

    /// Blocking and not yet resolved: the condition that gates publish.
    pub fn is_blocking_unresolved(&self) -> bool {
        self.severity == Severity::Blocking && !self.resolved
    }
}

/// Stable reporting order: severity descending, then type, then earliest
/// participant id, with the full participant set as the final tiebreak.
pub fn report_order(a: &Conflict, b: &Conflict) -> std::cmp::Ordering {
    b.severity
        .cmp(&a.severity)
        .then(a.conflict_type.cmp(&b.conflict_type))
        .then(a.session_ids.first().cmp(&b.session_ids.first()))
        .then(a.session_ids.cmp(&b.session_ids))
}
