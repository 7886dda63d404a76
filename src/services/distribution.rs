//! Planned-versus-scheduled unit reconciliation.
//!
//! A `DistributionRecord` is a pure function of the currently active sessions
//! for a subject/term plus the external quota: recomputing it with unchanged
//! inputs yields an identical record, so nothing here is cached.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::SubjectId;
use crate::db::error::{EngineError, EngineResult, ErrorContext};
use crate::db::repository::{QuotaSource, SessionRepository};
use crate::models::slot::{UnitBreakdown, UnitType};

/// Where a subject's scheduled units stand relative to its quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStanding {
    Under,
    OnTarget,
    Over,
}

/// Per-unit-type comparison of quota against scheduled load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDelta {
    pub unit_type: UnitType,
    pub planned: u16,
    pub scheduled: u32,
    /// `scheduled - planned`; negative means under-scheduled.
    pub delta: i64,
}

/// Reconciliation result for one subject in one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub subject: SubjectId,
    pub term: u8,
    pub planned: UnitBreakdown,
    pub deltas: Vec<UnitDelta>,
    /// Number of active sessions that contributed units.
    pub session_count: usize,
    pub standing: DistributionStanding,
}

impl DistributionRecord {
    pub fn delta_for(&self, unit_type: UnitType) -> Option<&UnitDelta> {
        self.deltas.iter().find(|d| d.unit_type == unit_type)
    }
}

/// Recomputes distribution records on demand from the session store and the
/// external quota lookup.
pub struct DistributionTracker {
    repo: Arc<dyn SessionRepository>,
    quotas: Arc<dyn QuotaSource>,
}

impl DistributionTracker {
    pub fn new(repo: Arc<dyn SessionRepository>, quotas: Arc<dyn QuotaSource>) -> Self {
        Self { repo, quotas }
    }

    /// Sum the unit types across active sessions for the subject/term and
    /// compare against the quota. A subject with no quota entry is `NotFound`,
    /// which is distinct from a delta of zero (on target).
    pub async fn reconcile(
        &self,
        subject: &SubjectId,
        term: u8,
    ) -> EngineResult<DistributionRecord> {
        let planned = self
            .quotas
            .planned_units(subject, term)
            .await?
            .ok_or_else(|| {
                EngineError::not_found_with_context(
                    format!("no distribution quota for subject {} in term {}", subject, term),
                    ErrorContext::new("reconcile")
                        .with_entity("quota")
                        .with_entity_id(subject.clone()),
                )
            })?;

        let sessions = self.repo.list_subject_term(subject, term).await?;

        let deltas: Vec<UnitDelta> = UnitType::ALL
            .iter()
            .map(|&unit_type| {
                let scheduled: u32 = sessions
                    .iter()
                    .map(|s| s.units.get(unit_type) as u32)
                    .sum();
                let quota = planned.get(unit_type);
                UnitDelta {
                    unit_type,
                    planned: quota,
                    scheduled,
                    delta: scheduled as i64 - quota as i64,
                }
            })
            .collect();

        let standing = if deltas.iter().any(|d| d.delta > 0) {
            DistributionStanding::Over
        } else if deltas.iter().any(|d| d.delta < 0) {
            DistributionStanding::Under
        } else {
            DistributionStanding::OnTarget
        };

        Ok(DistributionRecord {
            subject: subject.clone(),
            term,
            planned,
            deltas,
            session_count: sessions.len(),
            standing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SessionId;
    use crate::db::local::{InMemoryQuotas, LocalRepository};
    use crate::models::session::{ScheduleSession, SessionKind, SessionStatus};
    use crate::models::slot::{CohortScope, Scope, SlotSignature};
    use chrono::{Datelike, NaiveDate, Utc};

    async fn lecture_session(
        repo: &LocalRepository,
        start: u8,
        lectures: u16,
    ) -> ScheduleSession {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let now = Utc::now();
        repo.insert_session(ScheduleSession {
            id: SessionId::new(0),
            subject: SubjectId::new("CS301"),
            faculty_email: "rao@college.edu".to_string(),
            room: None,
            date,
            day: date.weekday(),
            slot: SlotSignature::new(date.weekday(), start, 1),
            units: UnitBreakdown::lectures(lectures),
            kind: SessionKind::Regular,
            assignment: None,
            scope: Scope::new("2026-27", "BTECH", 5),
            cohort: CohortScope::new(2024, 5, "CSE"),
            status: SessionStatus::Draft,
            deleted: false,
            created_by: "test".to_string(),
            created_at: now,
            updated_by: "test".to_string(),
            updated_at: now,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_under_scheduled_subject_reports_negative_delta() {
        let repo = Arc::new(LocalRepository::new());
        let quotas = Arc::new(InMemoryQuotas::new());
        let subject = SubjectId::new("CS301");
        quotas.set(subject.clone(), 5, UnitBreakdown::lectures(4));

        // Quota 4, three 1-unit lecture sessions scheduled.
        for start in [1, 3, 5] {
            lecture_session(&repo, start, 1).await;
        }

        let tracker = DistributionTracker::new(repo, quotas);
        let record = tracker.reconcile(&subject, 5).await.unwrap();

        let lecture = record.delta_for(UnitType::Lecture).unwrap();
        assert_eq!(lecture.planned, 4);
        assert_eq!(lecture.scheduled, 3);
        assert_eq!(lecture.delta, -1);
        assert_eq!(record.standing, DistributionStanding::Under);
        assert_eq!(record.session_count, 3);
    }

    #[tokio::test]
    async fn test_missing_quota_is_not_found() {
        let repo = Arc::new(LocalRepository::new());
        let tracker = DistributionTracker::new(repo, Arc::new(InMemoryQuotas::new()));
        let err = tracker
            .reconcile(&SubjectId::new("GHOST"), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let repo = Arc::new(LocalRepository::new());
        let quotas = Arc::new(InMemoryQuotas::new());
        let subject = SubjectId::new("CS301");
        quotas.set(subject.clone(), 5, UnitBreakdown::lectures(2));
        lecture_session(&repo, 1, 2).await;

        let tracker = DistributionTracker::new(repo, quotas);
        let first = tracker.reconcile(&subject, 5).await.unwrap();
        let second = tracker.reconcile(&subject, 5).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.standing, DistributionStanding::OnTarget);
    }

    #[tokio::test]
    async fn test_deleting_a_session_never_raises_the_scheduled_sum() {
        let repo = Arc::new(LocalRepository::new());
        let quotas = Arc::new(InMemoryQuotas::new());
        let subject = SubjectId::new("CS301");
        quotas.set(subject.clone(), 5, UnitBreakdown::lectures(4));

        lecture_session(&repo, 1, 2).await;
        let victim = lecture_session(&repo, 3, 1).await;

        let tracker = DistributionTracker::new(repo.clone(), quotas);
        let before = tracker.reconcile(&subject, 5).await.unwrap();

        let mut gone = repo.fetch_session(victim.id).await.unwrap();
        gone.deleted = true;
        repo.store_session(gone).await.unwrap();

        let after = tracker.reconcile(&subject, 5).await.unwrap();
        let before_sum = before.delta_for(UnitType::Lecture).unwrap().scheduled;
        let after_sum = after.delta_for(UnitType::Lecture).unwrap().scheduled;
        assert!(after_sum < before_sum);
        assert_eq!(after_sum, 2);
    }

    #[tokio::test]
    async fn test_archived_sessions_leave_the_scheduled_sum() {
        let repo = Arc::new(LocalRepository::new());
        let quotas = Arc::new(InMemoryQuotas::new());
        let subject = SubjectId::new("CS301");
        quotas.set(subject.clone(), 5, UnitBreakdown::lectures(4));

        let s = lecture_session(&repo, 1, 3).await;
        let tracker = DistributionTracker::new(repo.clone(), quotas);
        assert_eq!(
            tracker
                .reconcile(&subject, 5)
                .await
                .unwrap()
                .delta_for(UnitType::Lecture)
                .unwrap()
                .scheduled,
            3
        );

        repo.update_status_many(&[s.id], SessionStatus::Archived, "ops")
            .await
            .unwrap();
        assert_eq!(
            tracker
                .reconcile(&subject, 5)
                .await
                .unwrap()
                .delta_for(UnitType::Lecture)
                .unwrap()
                .scheduled,
            0
        );
    }
}
