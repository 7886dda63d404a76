//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::{AffiliationSource, QuotaSource, SessionRepository};
use crate::services::{
    ConflictDetector, DistributionTracker, FacultyScheduler, PublishGate, SessionStore,
};

/// Shared application state passed to all handlers. Construction wires the
/// engine components over one repository; there is no global singleton.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn SessionRepository>,
    pub store: Arc<SessionStore>,
    pub detector: Arc<ConflictDetector>,
    pub tracker: Arc<DistributionTracker>,
    pub scheduler: Arc<FacultyScheduler>,
    pub gate: Arc<PublishGate>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        quotas: Arc<dyn QuotaSource>,
        affiliations: Arc<dyn AffiliationSource>,
    ) -> Self {
        let detector = Arc::new(ConflictDetector::new(repository.clone(), quotas.clone()));
        Self {
            store: Arc::new(SessionStore::new(repository.clone(), detector.clone())),
            tracker: Arc::new(DistributionTracker::new(repository.clone(), quotas)),
            scheduler: Arc::new(FacultyScheduler::new(repository.clone(), affiliations)),
            gate: Arc::new(PublishGate::new(repository.clone(), detector.clone())),
            detector,
            repository,
        }
    }
}
