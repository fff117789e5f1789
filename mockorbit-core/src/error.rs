//! Error handling
//!
//! Structured errors carry where they were raised and a hint for the user. The session
//! core only produces these at the storage seam and while loading configuration; user-facing
//! session operations degrade instead of failing.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

pub type MockOrbitResult<T> = Result<T, MockOrbitError>;

/// Where and when an error was raised
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Correlates the log line with the error the caller reports
    pub error_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub component: &'static str,
    pub operation: Option<&'static str>,
    /// File the failing operation touched
    pub path: Option<PathBuf>,
    /// What the user can do about it
    pub hint: Option<&'static str>,
}

impl ErrorContext {
    pub fn new(component: &'static str) -> Self {
        Self {
            error_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            component,
            operation: None,
            path: None,
            hint: None,
        }
    }

    pub fn during(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn at_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }
}

#[derive(Error, Debug)]
pub enum MockOrbitError {
    /// Persistent store could not be read or written
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// Configuration file missing, unreadable or malformed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// A configured value breaks a routing or storage rule
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MockOrbitError {
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            MockOrbitError::Storage { context, .. }
            | MockOrbitError::Config { context, .. }
            | MockOrbitError::Validation { context, .. } => Some(context),
            MockOrbitError::Io(_) | MockOrbitError::Serialization(_) => None,
        }
    }

    /// Storage and IO failures may clear up on retry; config and validation never do.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MockOrbitError::Storage { .. } | MockOrbitError::Io(_))
    }

    /// Log at warn for recoverable errors, error otherwise
    pub fn log(&self) {
        let context = self.context();
        let error_id = context.map(|c| c.error_id);
        let path = context.and_then(|c| c.path.as_deref()).map(|p| p.display().to_string());
        let hint = context.and_then(|c| c.hint);

        if self.is_recoverable() {
            warn!(?error_id, ?path, ?hint, error = %self, "Storage error (may be recoverable)");
        } else {
            error!(?error_id, ?path, ?hint, error = %self, "Configuration or data error");
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::MockOrbitError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::MockOrbitError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .hint("Check that the data directory exists and is writable"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::MockOrbitError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .hint("Run 'mockorbit config --init' to create a default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::MockOrbitError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component),
        }
    };
}
