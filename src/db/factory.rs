//! Repository factory for dependency injection.
//!
//! Creates repository instances based on runtime configuration. Only the
//! in-memory backend ships today; the enum and factory keep the seam open for
//! a SQL backend behind the same trait.

use std::str::FromStr;
use std::sync::Arc;

use super::local::LocalRepository;
use super::repository::SessionRepository;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from the `REPOSITORY_TYPE` environment variable,
    /// defaulting to the in-memory backend.
    pub fn from_env() -> Self {
        std::env::var("REPOSITORY_TYPE")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(Self::Local)
    }
}

/// Factory for creating repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    pub fn create(repo_type: RepositoryType) -> Arc<dyn SessionRepository> {
        match repo_type {
            RepositoryType::Local => Self::create_local(),
        }
    }

    /// Create an in-memory repository.
    pub fn create_local() -> Arc<dyn SessionRepository> {
        Arc::new(LocalRepository::new())
    }
}
