//! Data Transfer Objects for the HTTP API.
//!
//! Most engine types already derive Serialize/Deserialize and are used in
//! responses as-is; this module adds the request envelopes and query types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::api::{
    AuditEntry, AvailabilityReport, Conflict, ConflictType, DistributionRecord, PublishOutcome,
    ScheduleSession, SessionDraft, SessionId, SessionPatch,
};
use crate::models::slot::Scope;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub repository: String,
}

/// Scope selector used by the conflict and session listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeQuery {
    pub academic_year: String,
    pub degree: String,
    pub term: u8,
}

impl ScopeQuery {
    pub fn scope(&self) -> Scope {
        Scope::new(self.academic_year.clone(), self.degree.clone(), self.term)
    }
}

/// Conflict listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictListResponse {
    pub conflicts: Vec<Conflict>,
    pub total: usize,
}

/// Request body for resolving a conflict by identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConflictRequest {
    #[serde(flatten)]
    pub scope: ScopeQuery,
    pub conflict_type: ConflictType,
    pub participants: Vec<SessionId>,
}

/// Term selector for the distribution endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermQuery {
    pub term: u8,
}

/// Request body for session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub actor: String,
    #[serde(flatten)]
    pub draft: SessionDraft,
}

/// Request body for a partial session update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
    pub actor: String,
    #[serde(flatten)]
    pub patch: SessionPatch,
}

/// Actor identity supplied as a query parameter (DELETE has no body).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorQuery {
    pub actor: String,
}

/// Request body for lifecycle transitions on a single session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRequest {
    pub actor: String,
}

/// Request body for a batch publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub session_ids: Vec<SessionId>,
    pub actor: String,
}

/// Session listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<ScheduleSession>,
    pub total: usize,
}

/// Audit trail response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrailResponse {
    pub entries: Vec<AuditEntry>,
    pub total: usize,
}

/// Query parameters for the availability probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub start_period: u8,
    pub span: u8,
}
