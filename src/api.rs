//! Public API surface for the timetable engine.
//!
//! This file consolidates the typed identifiers and re-exports the DTO types
//! produced by the service layer. All types derive Serialize/Deserialize for
//! JSON serialization.

pub use crate::models::conflict::{
    BridgeResource, Conflict, ConflictDetail, ConflictKey, ConflictType, OverlapWindow, Severity,
};
pub use crate::models::session::{
    AssignmentLink, AuditAction, AuditEntry, ScheduleSession, SessionDraft, SessionKind,
    SessionPatch, SessionStatus,
};
pub use crate::models::slot::{CohortScope, Scope, SlotSignature, UnitBreakdown, UnitType};
pub use crate::services::distribution::{DistributionRecord, DistributionStanding, UnitDelta};
pub use crate::services::faculty::{AvailabilityReport, FacultyLoad};
pub use crate::services::publish::PublishOutcome;

use serde::{Deserialize, Serialize};

/// Session identifier (surrogate key assigned by the repository).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SessionId(pub i64);

/// Subject code from the external offering catalog, e.g. "CS301".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

/// Assignment identifier from the external assignment records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub i64);

impl SessionId {
    pub fn new(value: i64) -> Self {
        SessionId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Self {
        SubjectId(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl AssignmentId {
    pub fn new(value: i64) -> Self {
        AssignmentId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SessionId> for i64 {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::{AssignmentId, SessionId, SubjectId};

    #[test]
    fn test_session_id_new() {
        let id = SessionId::new(42);
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_session_id_ordering() {
        let id1 = SessionId::new(1);
        let id2 = SessionId::new(2);
        assert!(id1 < id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_session_id_equality() {
        assert_eq!(SessionId::new(100), SessionId::new(100));
        assert_ne!(SessionId::new(100), SessionId::new(101));
    }

    #[test]
    fn test_subject_id_display() {
        let id = SubjectId::new("CS301");
        assert_eq!(id.to_string(), "CS301");
        assert_eq!(id.value(), "CS301");
    }

    #[test]
    fn test_assignment_id_new() {
        let id = AssignmentId::new(7);
        assert_eq!(id.value(), 7);
    }

    #[test]
    fn test_ids_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(SessionId::new(1));
        set.insert(SessionId::new(2));
        set.insert(SessionId::new(1)); // Duplicate
        assert_eq!(set.len(), 2);
    }
}
