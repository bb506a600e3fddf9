//! Structured error handling for the render pipeline
//!
//! Provides the crate-wide error enum, a `Result` alias, and an
//! extension trait for attaching message context.

use std::fmt;
use thiserror::Error;

/// Result type alias with RenderError
pub type Result<T> = std::result::Result<T, RenderError>;

/// Main error type for the render pipeline
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    /// Render plan validation failure. Fatal; no result is produced.
    #[error("Invalid render plan: {reason}")]
    InvalidPlan { reason: String },

    /// Per-transition validation failure. Logged as a warning and the
    /// transition is dropped; never aborts a render.
    #[error("Invalid transition: {reason}")]
    InvalidTransition { reason: String },

    /// No provider could be selected for a request
    #[error("No synthesis provider available")]
    NoProviderAvailable,

    /// A provider call failed. Non-fatal per segment; the segment is
    /// substituted with a zero-filled buffer of its estimated duration.
    #[error("Synthesis failed on provider '{provider}' ({kind}): {message}")]
    SynthesisFailed {
        provider: String,
        kind: FailureKind,
        message: String,
    },

    /// Codec collaborator error, surfaced verbatim
    #[error("Codec error ({operation}): {message}")]
    Codec {
        message: String,
        operation: CodecOperation,
    },

    /// Script or subtitle parse error
    #[error("Script parse error at line {line}: {message}")]
    ScriptParse { line: usize, message: String },

    /// Configuration or option validation error
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Internal/bug errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Failure classification for provider calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Per-request timeout elapsed
    Timeout,
    /// Transport-level failure (connect, DNS, TLS, broken stream)
    Network,
    /// The backend answered with an error status
    Backend,
    /// The backend answered, but the payload was unusable
    InvalidResponse,
}

impl FailureKind {
    /// Stable name used in statistics maps
    pub fn name(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::Backend => "backend",
            FailureKind::InvalidResponse => "invalid_response",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Codec operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOperation {
    Encoding,
    Decoding,
    Resampling,
    Filtering,
}

impl fmt::Display for CodecOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecOperation::Encoding => write!(f, "encoding"),
            CodecOperation::Decoding => write!(f, "decoding"),
            CodecOperation::Resampling => write!(f, "resampling"),
            CodecOperation::Filtering => write!(f, "filtering"),
        }
    }
}

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add a simple message context
    fn context(self, msg: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| RenderError::Internal {
            message: format!("{}: {}", f(), e),
        })
    }

    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| RenderError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

impl From<anyhow::Error> for RenderError {
    fn from(err: anyhow::Error) -> Self {
        RenderError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RenderError::InvalidPlan {
            reason: "line 'b1' references unknown character 'bob'".to_string(),
        };
        assert!(err.to_string().contains("Invalid render plan"));
        assert!(err.to_string().contains("bob"));
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::Timeout.to_string(), "timeout");
        assert_eq!(FailureKind::InvalidResponse.to_string(), "invalid_response");
    }

    #[test]
    fn test_synthesis_failed_display() {
        let err = RenderError::SynthesisFailed {
            provider: "expressive".to_string(),
            kind: FailureKind::Backend,
            message: "503 from upstream".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("expressive"));
        assert!(text.contains("backend"));
    }

    #[test]
    fn test_context_ext() {
        let base: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = base.context("loading preset").unwrap_err();
        assert!(err.to_string().contains("loading preset"));
    }
}
