//! Storage module for the timetable engine.
//!
//! This module provides abstractions for persistence via the Repository
//! pattern, allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API)                           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services/) - Engine Components          │
//! │  - Session store, conflict detector, publish gate       │
//! │  - Distribution tracker, faculty scheduler              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository.rs)                      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! There is deliberately no process-global repository: every component takes
//! an explicitly constructed `Arc<dyn SessionRepository>` so tests can run
//! isolated stores and concurrent scopes without shared mutable globals.

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod config;
pub mod error;
pub mod factory;
pub mod local;
pub mod repository;

pub use config::ServerConfig;
pub use error::{EngineError, EngineResult, ErrorContext};
pub use factory::{RepositoryFactory, RepositoryType};
pub use local::{InMemoryAffiliations, InMemoryQuotas, LocalRepository};
pub use repository::{AffiliationSource, QuotaSource, SessionRepository};
