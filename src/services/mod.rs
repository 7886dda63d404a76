//! Engine components built over the repository layer.
//!
//! Five services compose the engine: the session store owns mutations and the
//! audit trail, the conflict detector owns the derived conflict cache, the
//! distribution tracker and faculty scheduler recompute their views on
//! demand, and the publish gate enforces the lifecycle state machine.

pub mod conflicts;
pub mod distribution;
pub mod faculty;
pub mod publish;
pub mod store;


pub use conflicts::ConflictDetector;
pub use distribution::{DistributionRecord, DistributionStanding, DistributionTracker, UnitDelta};
pub use faculty::{AvailabilityReport, FacultyLoad, FacultyScheduler};
pub use publish::{PublishGate, PublishOutcome};
pub use store::SessionStore;
