use thiserror::Error;

/// Failure of a single translation lookup.
///
/// `Clone` because one in-flight backend call hands its result to every
/// caller waiting on the same cache key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// The backend was unreachable (`status: None`) or answered with a non-success status
    #[error("Translation backend error ({}): {message}", status_label(.status))]
    Backend {
        status: Option<u16>,
        message: String,
    },

    /// The backend answered 2xx but the body was not a translation
    #[error("Malformed translation response: {0}")]
    MalformedResponse(String),

    /// The per-request deadline elapsed
    #[error("Translation request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "network".to_string(),
    }
}

impl TranslationError {
    /// Timeouts, network errors, 429 and 5xx are worth another attempt.
    /// Other 4xx and malformed bodies will not get better by retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Backend { status: None, .. } => true,
            Self::Backend {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            Self::MalformedResponse(_) => false,
        }
    }
}

/// Metadata for one entity could not be interpreted. The entity is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot scan metadata of entity '{entity}': {reason}")]
pub struct MetadataScanError {
    pub entity: String,
    pub reason: String,
}

impl MetadataScanError {
    pub fn new(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

/// Errors escalated to the host at startup. Without a registry nothing can be translated.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Entity metadata is unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Translation registry is already initialized")]
    AlreadyInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display_with_status() {
        let err = TranslationError::Backend {
            status: Some(503),
            message: "unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Translation backend error (503): unavailable"
        );
    }

    #[test]
    fn test_backend_error_display_network() {
        let err = TranslationError::Backend {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("(network)"));
    }

    #[test]
    fn test_retryable_classification() {
        let backend = |status| TranslationError::Backend {
            status,
            message: String::new(),
        };

        assert!(TranslationError::Timeout { after_ms: 10 }.is_retryable());
        assert!(backend(None).is_retryable());
        assert!(backend(Some(429)).is_retryable());
        assert!(backend(Some(500)).is_retryable());
        assert!(backend(Some(502)).is_retryable());

        assert!(!backend(Some(400)).is_retryable());
        assert!(!backend(Some(401)).is_retryable());
        assert!(!backend(Some(404)).is_retryable());
        assert!(!TranslationError::MalformedResponse("x".to_string()).is_retryable());
    }

    #[test]
    fn test_metadata_scan_error_message() {
        let err = MetadataScanError::new("Books", "missing element list");
        assert_eq!(
            err.to_string(),
            "Cannot scan metadata of entity 'Books': missing element list"
        );
    }
}
