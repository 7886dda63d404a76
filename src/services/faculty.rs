//! Advisory faculty availability and load checks.
//!
//! Used *before* a session is created; once a session exists the conflict
//! detector is the after-the-fact authority. Nothing here blocks a mutation.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::SessionId;
use crate::db::error::EngineResult;
use crate::db::repository::{AffiliationSource, SessionRepository};
use crate::models::slot::SlotSignature;

/// A faculty member's load for one ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyLoad {
    pub faculty_email: String,
    pub week_year: i32,
    pub week: u32,
    pub session_count: usize,
    /// Unit-hours across the week's active sessions.
    pub unit_hours: u32,
    /// Maximum weekly unit-hours from affiliation data. `None` means no
    /// affiliation record exists and the load check is degraded to unchecked.
    pub ceiling: Option<u16>,
}

impl FacultyLoad {
    pub fn is_checked(&self) -> bool {
        self.ceiling.is_some()
    }
}

/// Result of an availability probe for a prospective assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub available: bool,
    /// Existing sessions of this faculty member at an overlapping
    /// date/period, across all timetable scopes.
    pub conflicting_session_ids: Vec<SessionId>,
    /// Whether adding the prospective assignment would push the weekly load
    /// past the affiliation ceiling. Always `false` when unchecked.
    pub overloaded: bool,
    pub load: FacultyLoad,
}

pub struct FacultyScheduler {
    repo: Arc<dyn SessionRepository>,
    affiliations: Arc<dyn AffiliationSource>,
}

impl FacultyScheduler {
    pub fn new(repo: Arc<dyn SessionRepository>, affiliations: Arc<dyn AffiliationSource>) -> Self {
        Self { repo, affiliations }
    }

    /// Probe whether a faculty member is free at `date` for periods
    /// `[start_period, start_period + span)`, and whether the assignment
    /// would overload the week.
    pub async fn check_availability(
        &self,
        faculty_email: &str,
        date: NaiveDate,
        start_period: u8,
        span: u8,
    ) -> EngineResult<AvailabilityReport> {
        let candidate = SlotSignature::new(date.weekday(), start_period, span);

        let same_day = self.repo.list_faculty_date(faculty_email, date).await?;
        let conflicting_session_ids: Vec<SessionId> = same_day
            .iter()
            .filter(|s| s.slot.overlaps(&candidate))
            .map(|s| s.id)
            .collect();

        let load = self.weekly_load(faculty_email, date).await?;
        let overloaded = match load.ceiling {
            Some(ceiling) => load.unit_hours + span as u32 > ceiling as u32,
            None => false,
        };

        Ok(AvailabilityReport {
            available: conflicting_session_ids.is_empty(),
            conflicting_session_ids,
            overloaded,
            load,
        })
    }

    /// Current load for the ISO week containing `date`.
    pub async fn weekly_load(
        &self,
        faculty_email: &str,
        date: NaiveDate,
    ) -> EngineResult<FacultyLoad> {
        let iso = date.iso_week();
        let sessions = self
            .repo
            .list_faculty_week(faculty_email, iso.year(), iso.week())
            .await?;
        let ceiling = self.affiliations.max_weekly_units(faculty_email).await?;

        Ok(FacultyLoad {
            faculty_email: faculty_email.to_string(),
            week_year: iso.year(),
            week: iso.week(),
            session_count: sessions.len(),
            unit_hours: sessions.iter().map(|s| s.units.total()).sum(),
            ceiling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SubjectId;
    use crate::db::local::{InMemoryAffiliations, LocalRepository};
    use crate::models::session::{ScheduleSession, SessionKind, SessionStatus};
    use crate::models::slot::{CohortScope, Scope, UnitBreakdown};
    use chrono::Utc;

    async fn booked(repo: &LocalRepository, date: NaiveDate, start: u8, span: u8, lectures: u16) {
        let now = Utc::now();
        repo.insert_session(ScheduleSession {
            id: SessionId::new(0),
            subject: SubjectId::new("CS301"),
            faculty_email: "rao@college.edu".to_string(),
            room: None,
            date,
            day: date.weekday(),
            slot: SlotSignature::new(date.weekday(), start, span),
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
        .unwrap();
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[tokio::test]
    async fn test_overlapping_booking_flags_unavailable() {
        let repo = Arc::new(LocalRepository::new());
        booked(&repo, monday(), 1, 2, 1).await;

        let scheduler = FacultyScheduler::new(repo, Arc::new(InMemoryAffiliations::new()));
        let report = scheduler
            .check_availability("rao@college.edu", monday(), 2, 2)
            .await
            .unwrap();
        assert!(!report.available);
        assert_eq!(report.conflicting_session_ids.len(), 1);

        let free = scheduler
            .check_availability("rao@college.edu", monday(), 3, 2)
            .await
            .unwrap();
        assert!(free.available);
        assert!(free.conflicting_session_ids.is_empty());
    }

    #[tokio::test]
    async fn test_weekly_ceiling_marks_overload() {
        let repo = Arc::new(LocalRepository::new());
        let affiliations = Arc::new(InMemoryAffiliations::new());
        affiliations.set("rao@college.edu", 4);

        // 3 unit-hours already booked this week.
        booked(&repo, monday(), 1, 1, 2).await;
        booked(&repo, monday().succ_opt().unwrap(), 1, 1, 1).await;

        let scheduler = FacultyScheduler::new(repo, affiliations);

        // A 1-period probe fits exactly; a 2-period probe tips over.
        let fits = scheduler
            .check_availability("rao@college.edu", monday(), 5, 1)
            .await
            .unwrap();
        assert!(!fits.overloaded);
        assert_eq!(fits.load.unit_hours, 3);
        assert_eq!(fits.load.session_count, 2);

        let over = scheduler
            .check_availability("rao@college.edu", monday(), 5, 2)
            .await
            .unwrap();
        assert!(over.overloaded);
    }

    #[tokio::test]
    async fn test_missing_affiliation_degrades_to_unchecked() {
        let repo = Arc::new(LocalRepository::new());
        booked(&repo, monday(), 1, 1, 10).await;

        let scheduler = FacultyScheduler::new(repo, Arc::new(InMemoryAffiliations::new()));
        let report = scheduler
            .check_availability("rao@college.edu", monday(), 5, 4)
            .await
            .unwrap();
        assert!(!report.overloaded);
        assert!(!report.load.is_checked());
    }

    #[tokio::test]
    async fn test_other_faculty_bookings_do_not_count() {
        let repo = Arc::new(LocalRepository::new());
        booked(&repo, monday(), 1, 2, 1).await;

        let scheduler = FacultyScheduler::new(repo, Arc::new(InMemoryAffiliations::new()));
        let report = scheduler
            .check_availability("iyer@college.edu", monday(), 1, 2)
            .await
            .unwrap();
        assert!(report.available);
        assert_eq!(report.load.session_count, 0);
    }
}
