//! Error handling for the dashboard core
//!
//! This module defines the crate error type and a Result alias for use
//! throughout the library. Missing device data is deliberately *not* an
//! error: extractors return `Option` and the chart pipeline discards empty
//! results silently.

use thiserror::Error;

/// Main error type for dashboard operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A path with no segments was used where at least one is required
    #[error("Invalid path: a path used for set must not be empty")]
    InvalidPath,

    /// A path walked into something that cannot hold the next segment
    #[error("Cannot descend into {found} at '{prefix}'")]
    NotAContainer { prefix: String, found: &'static str },

    /// A sequence index too large to materialize
    #[error("Index {index} at '{prefix}' exceeds the sequence limit")]
    IndexTooLarge { prefix: String, index: usize },

    /// A value expected at a path was absent
    #[error("No value at '{0}'")]
    MissingValue(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// No async runtime was available for timers
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DashboardError>,
    },
}

impl DashboardError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DashboardError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DashboardError::MissingValue("gimbal.max_rate".to_string());
        assert_eq!(err.to_string(), "No value at 'gimbal.max_rate'");
    }

    #[test]
    fn test_error_with_context() {
        let err = DashboardError::InvalidPath;
        let with_ctx = err.with_context("Building config update");
        assert!(with_ctx.to_string().contains("Building config update"));
        assert!(with_ctx.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_not_a_container_error() {
        let err = DashboardError::NotAContainer {
            prefix: "gimbal.max_rate".to_string(),
            found: "a number",
        };
        assert!(err.to_string().contains("gimbal.max_rate"));
        assert!(err.to_string().contains("a number"));
    }

    #[test]
    fn test_result_ext_context() {
        let result: Result<()> = Err(DashboardError::Channel("closed".to_string()));
        let err = result.context("Sending poll request").unwrap_err();
        assert!(err.to_string().starts_with("Sending poll request"));
    }
}
