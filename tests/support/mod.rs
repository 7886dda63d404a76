//! Shared fixtures for the integration tests.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use timetable_engine::api::{SessionDraft, SubjectId};
use timetable_engine::db::{InMemoryAffiliations, InMemoryQuotas, LocalRepository};
use timetable_engine::models::session::SessionKind;
use timetable_engine::models::slot::{CohortScope, Scope, SlotSignature, UnitBreakdown};
use timetable_engine::services::{
    ConflictDetector, DistributionTracker, FacultyScheduler, PublishGate, SessionStore,
};

/// A fully wired engine over one in-memory repository.
pub struct Engine {
    pub repo: Arc<LocalRepository>,
    pub quotas: Arc<InMemoryQuotas>,
    pub affiliations: Arc<InMemoryAffiliations>,
    pub store: SessionStore,
    pub detector: Arc<ConflictDetector>,
    pub tracker: DistributionTracker,
    pub scheduler: FacultyScheduler,
    pub gate: PublishGate,
}

impl Engine {
    pub fn new() -> Self {
        let repo = Arc::new(LocalRepository::new());
        let quotas = Arc::new(InMemoryQuotas::new());
        let affiliations = Arc::new(InMemoryAffiliations::new());
        let detector = Arc::new(ConflictDetector::new(repo.clone(), quotas.clone()));
        Self {
            store: SessionStore::new(repo.clone(), detector.clone()),
            tracker: DistributionTracker::new(repo.clone(), quotas.clone()),
            scheduler: FacultyScheduler::new(repo.clone(), affiliations.clone()),
            gate: PublishGate::new(repo.clone(), detector.clone()),
            detector,
            repo,
            quotas,
            affiliations,
        }
    }
}

pub fn scope() -> Scope {
    Scope::new("2026-27", "BTECH", 5)
}

/// 2026-03-02 is a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

/// Draft builder with sensible defaults; tests override what they care about.
pub struct DraftBuilder {
    draft: SessionDraft,
}

impl DraftBuilder {
    pub fn new() -> Self {
        let date = monday();
        Self {
            draft: SessionDraft {
                subject: SubjectId::new("CS301"),
                faculty_email: "rao@college.edu".to_string(),
                room: None,
                date,
                slot: SlotSignature::new(date.weekday(), 1, 2),
                units: UnitBreakdown::lectures(1),
                kind: SessionKind::Regular,
                assignment: None,
                scope: scope(),
                cohort: CohortScope::new(2024, 5, "CSE"),
            },
        }
    }

    pub fn subject(mut self, code: &str) -> Self {
        self.draft.subject = SubjectId::new(code);
        self
    }

    pub fn faculty(mut self, email: &str) -> Self {
        self.draft.faculty_email = email.to_string();
        self
    }

    pub fn room(mut self, room: &str) -> Self {
        self.draft.room = Some(room.to_string());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.draft.date = date;
        self.draft.slot.day = date.weekday();
        self
    }

    pub fn periods(mut self, start: u8, span: u8) -> Self {
        self.draft.slot.start_period = start;
        self.draft.slot.span = span;
        self
    }

    pub fn units(mut self, units: UnitBreakdown) -> Self {
        self.draft.units = units;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.draft.scope = scope;
        self
    }

    pub fn cohort(mut self, batch_year: i32, semester: u8, branch: &str) -> Self {
        self.draft.cohort = CohortScope::new(batch_year, semester, branch);
        self
    }

    pub fn build(self) -> SessionDraft {
        self.draft
    }
}
