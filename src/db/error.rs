//! Error taxonomy for engine operations.
//!
//! Validation and state errors are local and returned synchronously; they are
//! never retried. Concurrency conflicts are the caller's responsibility to
//! retry after a refetch. Blocking conflicts are data, not errors; they only
//! become `PublishBlocked` when a publish is attempted over them.

use std::fmt;

use crate::models::conflict::Conflict;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Structured context for engine errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "create_session", "publish")
    pub operation: Option<String>,
    /// The entity type involved (e.g., "session", "quota")
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether the caller may retry after refetching state
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed session: bad span, no units, day mismatch. Rejected before
    /// any mutation.
    #[error("Validation error: {message} {context}")]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// Unknown session, subject, or quota. No side effect.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Stale write: the caller's update token no longer matches. Refetch and
    /// retry; never silently merged.
    #[error("Concurrency conflict: {message} {context}")]
    Concurrency {
        message: String,
        context: ErrorContext,
    },

    /// Illegal lifecycle transition; original state preserved.
    #[error("State error: {message} {context}")]
    State {
        message: String,
        context: ErrorContext,
    },

    /// Publish attempted while unresolved blocking conflicts exist for the
    /// batch. Carries the offending conflicts for the caller.
    #[error("Publish blocked: {message} {context}")]
    PublishBlocked {
        message: String,
        context: ErrorContext,
        conflicts: Vec<Conflict>,
    },

    /// Configuration or initialization error.
    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("Internal error: {message} {context}")]
    Internal {
        message: String,
        context: ErrorContext,
    },
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn validation_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Validation {
            message: message.into(),
            context,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::Concurrency {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn publish_blocked(message: impl Into<String>, conflicts: Vec<Conflict>) -> Self {
        Self::PublishBlocked {
            message: message.into(),
            context: ErrorContext::new("publish"),
            conflicts,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Check if this error is retryable after the caller refetches state.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Concurrency { context, .. } => context.retryable,
            _ => false,
        }
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Validation { context, .. } => context,
            Self::NotFound { context, .. } => context,
            Self::Concurrency { context, .. } => context,
            Self::State { context, .. } => context,
            Self::PublishBlocked { context, .. } => context,
            Self::Configuration { context, .. } => context,
            Self::Internal { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::Validation { context, .. }
            | Self::NotFound { context, .. }
            | Self::Concurrency { context, .. }
            | Self::State { context, .. }
            | Self::PublishBlocked { context, .. }
            | Self::Configuration { context, .. }
            | Self::Internal { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::internal(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::internal(s.to_string())
    }
}
