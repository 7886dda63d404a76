//! Server configuration from environment variables with an optional TOML
//! overlay.

use std::env;
use std::path::Path;

use serde::Deserialize;

use super::factory::RepositoryType;
use crate::db::error::{EngineError, EngineResult};

/// Optional file-based configuration, merged under the environment.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    repository: Option<String>,
}

/// Runtime configuration for the server binary.
///
/// # Environment Variables
/// - `HOST` (optional, default: 0.0.0.0): bind address
/// - `PORT` (optional, default: 8080): bind port
/// - `REPOSITORY_TYPE` (optional, default: local): storage backend
/// - `TIMETABLE_CONFIG` (optional): path to a TOML file providing defaults
///   for any of the above; environment variables win.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub repository: RepositoryType,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            repository: RepositoryType::Local,
        }
    }
}

impl ServerConfig {
    /// Load configuration: defaults, then the optional TOML file, then the
    /// environment.
    pub fn load() -> EngineResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = env::var("TIMETABLE_CONFIG") {
            let file = Self::read_file(Path::new(&path))?;
            if let Some(host) = file.host {
                config.host = host;
            }
            if let Some(port) = file.port {
                config.port = port;
            }
            if let Some(repo) = file.repository {
                config.repository = repo
                    .parse()
                    .map_err(EngineError::configuration)?;
            }
        }

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|e| EngineError::configuration(format!("invalid PORT: {}", e)))?;
        }
        if env::var("REPOSITORY_TYPE").is_ok() {
            config.repository = RepositoryType::from_env();
        }

        Ok(config)
    }

    fn read_file(path: &Path) -> EngineResult<FileConfig> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::configuration(format!("cannot read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&raw).map_err(|e| {
            EngineError::configuration(format!("cannot parse config {}: {}", path.display(), e))
        })
    }

    /// Bind address string, e.g. "0.0.0.0:8080".
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.repository, RepositoryType::Local);
    }

    #[test]
    fn test_file_config_parses() {
        let file: FileConfig = toml::from_str("host = \"127.0.0.1\"\nport = 9090\n").unwrap();
        assert_eq!(file.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(file.port, Some(9090));
        assert!(file.repository.is_none());
    }
}
