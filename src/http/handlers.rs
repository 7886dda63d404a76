//! HTTP handlers for the REST API.
//!
//! Each handler parses the request, delegates to the service layer, and maps
//! engine errors onto HTTP statuses via `AppError`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    ActorQuery, ActorRequest, AuditTrailResponse, AvailabilityQuery, ConflictListResponse,
    CreateSessionRequest, HealthResponse, PublishRequest, ResolveConflictRequest, ScopeQuery,
    SessionListResponse, TermQuery, UpdateSessionRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    AvailabilityReport, Conflict, DistributionRecord, PublishOutcome, ScheduleSession, SessionId,
    SubjectId,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repository = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository,
    }))
}

// =============================================================================
// Conflicts
// =============================================================================

/// GET /v1/conflicts?academic_year=..&degree=..&term=..
///
/// Full rescan of the requested scope; returns the ordered conflict set.
pub async fn scan_conflicts(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> HandlerResult<ConflictListResponse> {
    let conflicts = state.detector.scan(&query.scope()).await?;
    let total = conflicts.len();
    Ok(Json(ConflictListResponse { conflicts, total }))
}

/// POST /v1/conflicts/resolve
pub async fn resolve_conflict(
    State(state): State<AppState>,
    Json(request): Json<ResolveConflictRequest>,
) -> HandlerResult<Conflict> {
    if request.participants.is_empty() {
        return Err(AppError::BadRequest(
            "participants must not be empty".to_string(),
        ));
    }
    let resolved = state
        .detector
        .resolve(
            &request.scope.scope(),
            request.conflict_type,
            request.participants,
        )
        .await?;
    Ok(Json(resolved))
}

// =============================================================================
// Distribution
// =============================================================================

/// GET /v1/distribution/{subject}?term=..
pub async fn get_distribution(
    State(state): State<AppState>,
    Path(subject): Path<String>,
    Query(query): Query<TermQuery>,
) -> HandlerResult<DistributionRecord> {
    let record = state
        .tracker
        .reconcile(&SubjectId::new(subject), query.term)
        .await?;
    Ok(Json(record))
}

// =============================================================================
// Sessions
// =============================================================================

/// POST /v1/sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ScheduleSession>), AppError> {
    let session = state.store.create(request.draft, &request.actor).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /v1/sessions?academic_year=..&degree=..&term=..
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> HandlerResult<SessionListResponse> {
    let sessions = state.repository.list_scope(&query.scope()).await?;
    let total = sessions.len();
    Ok(Json(SessionListResponse { sessions, total }))
}

/// GET /v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ScheduleSession> {
    let session = state.store.get(SessionId::new(id)).await?;
    Ok(Json(session))
}

/// PATCH /v1/sessions/{id}
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSessionRequest>,
) -> HandlerResult<ScheduleSession> {
    let session = state
        .store
        .update(SessionId::new(id), request.patch, &request.actor)
        .await?;
    Ok(Json(session))
}

/// DELETE /v1/sessions/{id}?actor=..
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<StatusCode, AppError> {
    state.store.delete(SessionId::new(id), &query.actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/sessions/{id}/audit
pub async fn get_audit_trail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<AuditTrailResponse> {
    let entries = state.store.audit_trail(SessionId::new(id)).await?;
    let total = entries.len();
    Ok(Json(AuditTrailResponse { entries, total }))
}

// =============================================================================
// Lifecycle
// =============================================================================

/// POST /v1/sessions/publish
pub async fn publish_sessions(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> HandlerResult<PublishOutcome> {
    let outcome = state
        .gate
        .publish(&request.session_ids, &request.actor)
        .await?;
    Ok(Json(outcome))
}

/// POST /v1/sessions/{id}/unpublish
pub async fn unpublish_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ActorRequest>,
) -> HandlerResult<ScheduleSession> {
    let session = state
        .gate
        .unpublish(SessionId::new(id), &request.actor)
        .await?;
    Ok(Json(session))
}

/// POST /v1/sessions/{id}/archive
pub async fn archive_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ActorRequest>,
) -> HandlerResult<ScheduleSession> {
    let session = state
        .gate
        .archive(SessionId::new(id), &request.actor)
        .await?;
    Ok(Json(session))
}

// =============================================================================
// Faculty
// =============================================================================

/// GET /v1/faculty/{email}/availability?date=..&start_period=..&span=..
pub async fn check_availability(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> HandlerResult<AvailabilityReport> {
    if query.span < 1 || query.start_period < 1 {
        return Err(AppError::BadRequest(
            "start_period and span must be at least 1".to_string(),
        ));
    }
    let report = state
        .scheduler
        .check_availability(&email, query.date, query.start_period, query.span)
        .await?;
    Ok(Json(report))
}
