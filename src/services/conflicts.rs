//! Conflict detection over scheduled sessions.
//!
//! The detector owns a derived, rebuildable cache of conflicts keyed by
//! detection scope. It is never the source of truth: any scope's cache may be
//! discarded and recomputed from the repository at any time, and a full
//! rescan must always equal the union of all valid incremental rescans.
//!
//! Recomputation is serialized per scope (no two recomputations for the same
//! scope run concurrently); disjoint scopes proceed in parallel.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use log::warn;
use parking_lot::{Mutex, RwLock};

use crate::api::{SessionId, SubjectId};
use crate::db::error::{EngineError, EngineResult};
use crate::db::repository::{QuotaSource, SessionRepository};
use crate::models::conflict::{
    report_order, BridgeResource, Conflict, ConflictDetail, ConflictKey, ConflictType,
    OverlapWindow, Severity,
};
use crate::models::session::ScheduleSession;
use crate::models::slot::{Scope, UnitType};

type ScopeCache = BTreeMap<ConflictKey, Conflict>;

/// Detects and caches conflicts per (academic year, degree, term) scope.
pub struct ConflictDetector {
    repo: Arc<dyn SessionRepository>,
    quotas: Arc<dyn QuotaSource>,
    cache: RwLock<HashMap<Scope, ScopeCache>>,
    /// Per-scope recompute guards. Held across repository reads, so these
    /// must be async mutexes; the map itself is only locked briefly.
    guards: Mutex<HashMap<Scope, Arc<tokio::sync::Mutex<()>>>>,
}

impl ConflictDetector {
    pub fn new(repo: Arc<dyn SessionRepository>, quotas: Arc<dyn QuotaSource>) -> Self {
        Self {
            repo,
            quotas,
            cache: RwLock::new(HashMap::new()),
            guards: Mutex::new(HashMap::new()),
        }
    }

    fn guard(&self, scope: &Scope) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self.guards.lock();
        guards
            .entry(scope.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Full rescan of a scope. Deterministic: the same session set always
    /// produces the same ordered conflict sequence regardless of scan order.
    pub async fn scan(&self, scope: &Scope) -> EngineResult<Vec<Conflict>> {
        let guard = self.guard(scope);
        let _held = guard.lock().await;

        let computed = self.compute_scope(scope).await?;
        let merged = {
            let cache = self.cache.read();
            let previous = cache.get(scope);
            merge_preserving(previous, computed)
        };
        let report = ordered(&merged);
        self.cache.write().insert(scope.clone(), merged);
        Ok(report)
    }

    /// The last computed conflict set for a scope, without rescanning.
    pub fn cached(&self, scope: &Scope) -> Vec<Conflict> {
        self.cache
            .read()
            .get(scope)
            .map(ordered)
            .unwrap_or_default()
    }

    /// Incremental rescan after a session mutation. Only conflicts whose
    /// participant set intersects the changed session's window are
    /// recomputed; every other cached conflict is retained unchanged.
    pub async fn on_session_changed(
        &self,
        scope: &Scope,
        session: &ScheduleSession,
    ) -> EngineResult<()> {
        let guard = self.guard(scope);
        let _held = guard.lock().await;

        let previous = self.cache.read().get(scope).cloned();
        let Some(previous) = previous else {
            // No cache yet for this scope; it will be built lazily on the
            // first scan, which sees the mutated state anyway. Foreign caches
            // still need their bridge mirrors refreshed, so compute this
            // session's bridges before evicting.
            let mut fresh: ScopeCache = BTreeMap::new();
            let sessions = self.repo.list_scope(scope).await?;
            if let Some(current) = sessions.iter().find(|s| s.id == session.id) {
                self.bridge_for(scope, current, &mut fresh).await?;
            }
            self.evict_foreign_bridges(scope, session.id, &fresh);
            return Ok(());
        };

        // Drop every conflict the changed session participates in, noting
        // which overconsumption subjects lose a participant so their subject
        // totals can be recomputed without it.
        let mut subjects: BTreeSet<SubjectId> = BTreeSet::new();
        subjects.insert(session.subject.clone());
        let mut retained: ScopeCache = BTreeMap::new();
        for (key, conflict) in &previous {
            if key.participants.contains(&session.id) {
                if let ConflictDetail::Overconsumption { subject, .. } = &conflict.detail {
                    subjects.insert(subject.clone());
                }
            } else {
                retained.insert(key.clone(), conflict.clone());
            }
        }
        retained.retain(|_, conflict| match &conflict.detail {
            ConflictDetail::Overconsumption { subject, .. } => !subjects.contains(subject),
            _ => true,
        });

        // Recompute the affected window only.
        let sessions = self.repo.list_scope(scope).await?;
        let mut fresh: ScopeCache = BTreeMap::new();
        if let Some(current) = sessions.iter().find(|s| s.id == session.id) {
            for other in &sessions {
                if other.id != current.id {
                    classify_pair(current, other, &mut fresh);
                }
            }
            self.bridge_for(scope, current, &mut fresh).await?;
        }
        for subject in &subjects {
            self.overconsumption_for(scope, subject, &sessions, &mut fresh)
                .await?;
        }

        self.evict_foreign_bridges(scope, session.id, &fresh);

        for (key, mut conflict) in fresh {
            if let Some(prev) = previous.get(&key) {
                conflict.resolved = prev.resolved;
                conflict.detected_at = prev.detected_at;
            }
            retained.insert(key, conflict);
        }
        self.cache.write().insert(scope.clone(), retained);
        Ok(())
    }

    /// Operator resolution of a conflict by identity. Bridge conflicts are
    /// mirrored into both involved scopes, so resolving in either clears
    /// both views.
    pub async fn resolve(
        &self,
        scope: &Scope,
        conflict_type: ConflictType,
        participants: Vec<SessionId>,
    ) -> EngineResult<Conflict> {
        let key = ConflictKey::new(conflict_type, participants);
        let guard = self.guard(scope);
        let _held = guard.lock().await;

        let mut cache = self.cache.write();
        let resolved = {
            let scoped = cache.get_mut(scope).ok_or_else(|| {
                EngineError::not_found(format!("no conflict cache for scope {}", scope))
            })?;
            let conflict = scoped.get_mut(&key).ok_or_else(|| {
                EngineError::not_found(format!(
                    "no {} conflict with participants {:?} in scope {}",
                    key.conflict_type.as_str(),
                    key.participants,
                    scope
                ))
            })?;
            conflict.resolved = true;
            conflict.clone()
        };

        if conflict_type == ConflictType::Bridge {
            for (other, scoped) in cache.iter_mut() {
                if other != scope {
                    if let Some(mirror) = scoped.get_mut(&key) {
                        mirror.resolved = true;
                    }
                }
            }
        }
        Ok(resolved)
    }

    /// Unresolved blocking conflicts from the cache that touch any of the
    /// given sessions. Used by the publish gate after a fresh scan.
    pub fn unresolved_blocking(
        &self,
        scope: &Scope,
        batch: &HashSet<SessionId>,
    ) -> Vec<Conflict> {
        self.cache
            .read()
            .get(scope)
            .map(|scoped| {
                let mut out: Vec<_> = scoped
                    .values()
                    .filter(|c| {
                        c.is_blocking_unresolved()
                            && c.session_ids.iter().any(|id| batch.contains(id))
                    })
                    .cloned()
                    .collect();
                out.sort_by(report_order);
                out
            })
            .unwrap_or_default()
    }

    /// Unresolved warning-level conflicts touching the batch: surfaced for
    /// acknowledgment, never blocking.
    pub fn unresolved_warnings(
        &self,
        scope: &Scope,
        batch: &HashSet<SessionId>,
    ) -> Vec<Conflict> {
        self.cache
            .read()
            .get(scope)
            .map(|scoped| {
                let mut out: Vec<_> = scoped
                    .values()
                    .filter(|c| {
                        !c.resolved
                            && c.severity == Severity::Warning
                            && c.session_ids.iter().any(|id| batch.contains(id))
                    })
                    .cloned()
                    .collect();
                out.sort_by(report_order);
                out
            })
            .unwrap_or_default()
    }

    /// Discard a scope's cache entirely. The next scan rebuilds it.
    pub fn invalidate(&self, scope: &Scope) {
        self.cache.write().remove(scope);
    }

    // ------------------------------------------------------------------
    // Computation
    // ------------------------------------------------------------------

    async fn compute_scope(&self, scope: &Scope) -> EngineResult<ScopeCache> {
        let sessions = self.repo.list_scope(scope).await?;
        let mut found: ScopeCache = BTreeMap::new();

        for (i, a) in sessions.iter().enumerate() {
            for b in sessions.iter().skip(i + 1) {
                classify_pair(a, b, &mut found);
            }
        }

        let subjects: BTreeSet<SubjectId> =
            sessions.iter().map(|s| s.subject.clone()).collect();
        for subject in &subjects {
            self.overconsumption_for(scope, subject, &sessions, &mut found)
                .await?;
        }

        for session in &sessions {
            self.bridge_for(scope, session, &mut found).await?;
        }

        Ok(found)
    }

    /// Distribution overconsumption for one subject within a scope. A missing
    /// or unavailable quota degrades to "no check" so one bad reference does
    /// not block detection for unrelated sessions.
    async fn overconsumption_for(
        &self,
        scope: &Scope,
        subject: &SubjectId,
        sessions: &[ScheduleSession],
        found: &mut ScopeCache,
    ) -> EngineResult<()> {
        let planned = match self.quotas.planned_units(subject, scope.term).await {
            Ok(planned) => planned,
            Err(e) => {
                warn!("quota lookup failed for {}: {}; skipping", subject, e);
                None
            }
        };
        let Some(planned) = planned else {
            return Ok(());
        };

        let subject_sessions: Vec<&ScheduleSession> =
            sessions.iter().filter(|s| &s.subject == subject).collect();

        for unit_type in UnitType::ALL {
            let scheduled: u32 = subject_sessions
                .iter()
                .map(|s| s.units.get(unit_type) as u32)
                .sum();
            let quota = planned.get(unit_type);
            if scheduled <= quota as u32 {
                continue;
            }

            let participants: Vec<SessionId> = subject_sessions
                .iter()
                .filter(|s| s.units.get(unit_type) > 0)
                .map(|s| s.id)
                .collect();
            if participants.is_empty() {
                continue;
            }

            let conflict = Conflict::new(
                Severity::Warning,
                participants,
                format!(
                    "subject {} exceeds its planned {} quota: {} units scheduled of {} planned",
                    subject, unit_type, scheduled, quota
                ),
                ConflictDetail::Overconsumption {
                    subject: subject.clone(),
                    unit_type,
                    planned: quota,
                    scheduled,
                },
                true,
            );
            found.insert(conflict.key(), conflict);
        }
        Ok(())
    }

    /// Bridge conflicts: sessions in a *different* timetable scope sharing
    /// this session's faculty member or room at an overlapping date/period.
    async fn bridge_for(
        &self,
        scope: &Scope,
        session: &ScheduleSession,
        found: &mut ScopeCache,
    ) -> EngineResult<()> {
        let by_faculty = self
            .repo
            .list_faculty_date(&session.faculty_email, session.date)
            .await?;
        for other in &by_faculty {
            if other.scope != *scope && session.slot.overlaps(&other.slot) {
                let conflict = bridge_conflict(
                    session,
                    other,
                    BridgeResource::Faculty(session.faculty_email.clone()),
                );
                found.entry(conflict.key()).or_insert(conflict);
            }
        }

        if let Some(room) = &session.room {
            let by_room = self.repo.list_room_date(room, session.date).await?;
            for other in &by_room {
                if other.scope != *scope && session.slot.overlaps(&other.slot) {
                    let conflict =
                        bridge_conflict(session, other, BridgeResource::Room(room.clone()));
                    found.entry(conflict.key()).or_insert(conflict);
                }
            }
        }
        Ok(())
    }

    /// Bridge conflicts live in both involved scopes' caches under the same
    /// key. When a session changes, evict its stale bridge entries from every
    /// other cached scope and mirror in the freshly computed ones.
    fn evict_foreign_bridges(&self, scope: &Scope, changed: SessionId, fresh: &ScopeCache) {
        let mut cache = self.cache.write();
        for (other_scope, scoped) in cache.iter_mut() {
            if other_scope == scope {
                continue;
            }
            scoped.retain(|key, _| {
                key.conflict_type != ConflictType::Bridge
                    || !key.participants.contains(&changed)
            });
            for (key, conflict) in fresh {
                if key.conflict_type != ConflictType::Bridge {
                    continue;
                }
                if let ConflictDetail::Bridge {
                    resource,
                    other_scope: target,
                    window,
                } = &conflict.detail
                {
                    if target == other_scope {
                        let mut mirrored = conflict.clone();
                        mirrored.detail = ConflictDetail::Bridge {
                            resource: resource.clone(),
                            other_scope: scope.clone(),
                            window: *window,
                        };
                        scoped.insert(key.clone(), mirrored);
                    }
                }
            }
        }
    }
}

// ----------------------------------------------------------------------
// Pure classification helpers
// ----------------------------------------------------------------------

fn overlap_window(a: &ScheduleSession, b: &ScheduleSession) -> Option<OverlapWindow> {
    if a.date != b.date {
        return None;
    }
    a.slot
        .overlap_range(&b.slot)
        .map(|(start_period, end_period)| OverlapWindow {
            date: a.date,
            start_period,
            end_period,
        })
}

/// Classify one overlapping pair within a scope into faculty/division/room
/// conflicts. Each applicable type gets its own keyed conflict.
fn classify_pair(a: &ScheduleSession, b: &ScheduleSession, found: &mut ScopeCache) {
    let Some(window) = overlap_window(a, b) else {
        return;
    };
    let participants = vec![a.id, b.id];

    if a.faculty_email == b.faculty_email {
        let conflict = Conflict::new(
            Severity::Blocking,
            participants.clone(),
            format!(
                "faculty {} is double-booked on {} ({})",
                a.faculty_email, a.date, a.slot
            ),
            ConflictDetail::Faculty {
                faculty_email: a.faculty_email.clone(),
                window,
            },
            false,
        )
        .with_faculty(vec![a.faculty_email.clone()])
        .with_cohorts(vec![a.cohort.clone(), b.cohort.clone()]);
        found.insert(conflict.key(), conflict);
    }

    if a.cohort == b.cohort {
        let conflict = Conflict::new(
            Severity::Blocking,
            participants.clone(),
            format!(
                "cohort {} has overlapping sessions on {} ({})",
                a.cohort, a.date, a.slot
            ),
            ConflictDetail::Division {
                cohort: a.cohort.clone(),
                window,
            },
            false,
        )
        .with_faculty(vec![a.faculty_email.clone(), b.faculty_email.clone()])
        .with_cohorts(vec![a.cohort.clone()]);
        found.insert(conflict.key(), conflict);
    }

    if let (Some(room_a), Some(room_b)) = (&a.room, &b.room) {
        if room_a == room_b {
            let conflict = Conflict::new(
                Severity::Blocking,
                participants,
                format!("room {} is double-booked on {} ({})", room_a, a.date, a.slot),
                ConflictDetail::Room {
                    room: room_a.clone(),
                    window,
                },
                false,
            )
            .with_faculty(vec![a.faculty_email.clone(), b.faculty_email.clone()])
            .with_cohorts(vec![a.cohort.clone(), b.cohort.clone()]);
            found.insert(conflict.key(), conflict);
        }
    }
}

fn bridge_conflict(
    session: &ScheduleSession,
    other: &ScheduleSession,
    resource: BridgeResource,
) -> Conflict {
    let window = overlap_window(session, other).unwrap_or(OverlapWindow {
        date: session.date,
        start_period: session.slot.start_period,
        end_period: session.slot.end_period(),
    });
    let resource_label = match &resource {
        BridgeResource::Faculty(email) => format!("faculty {}", email),
        BridgeResource::Room(room) => format!("room {}", room),
    };
    Conflict::new(
        Severity::Warning,
        vec![session.id, other.id],
        format!(
            "{} is shared with timetable {} at an overlapping time on {}",
            resource_label, other.scope, session.date
        ),
        ConflictDetail::Bridge {
            resource,
            other_scope: other.scope.clone(),
            window,
        },
        false,
    )
    .with_faculty(vec![
        session.faculty_email.clone(),
        other.faculty_email.clone(),
    ])
    .with_cohorts(vec![session.cohort.clone(), other.cohort.clone()])
}

/// Carry resolution state across a recomputation: a conflict that is still
/// reproduced keeps its resolved flag and original detection time; one that
/// is no longer reproduced disappears (auto-resolution).
fn merge_preserving(previous: Option<&ScopeCache>, computed: ScopeCache) -> ScopeCache {
    let Some(previous) = previous else {
        return computed;
    };
    computed
        .into_iter()
        .map(|(key, mut conflict)| {
            if let Some(prev) = previous.get(&key) {
                conflict.resolved = prev.resolved;
                conflict.detected_at = prev.detected_at;
            }
            (key, conflict)
        })
        .collect()
}

fn ordered(cache: &ScopeCache) -> Vec<Conflict> {
    let mut out: Vec<_> = cache.values().cloned().collect();
    out.sort_by(report_order);
    out
}
