//! Error handling for the IDL viewer.
//!
//! Every fallible library operation returns [`ViewerResult`]. The variants map
//! one-to-one onto the ways a load can fail: the raw document has the wrong
//! shape, the explorer lookup fails, or local I/O fails. [`ErrorExt`] attaches
//! the component and operation to foreign errors so log lines say where a
//! failure happened.

use std::fmt;
use thiserror::Error;

/// Main error type for the IDL viewer.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// The raw document is not a JSON object, or a collection has the wrong shape.
    #[error("Invalid IDL format: {0}")]
    InvalidFormat(String),

    /// A field required by strict normalization is absent.
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// The explorer lookup was called without a program id.
    #[error("Program ID is required")]
    MissingProgramId,

    /// The program id is not a base58 encoded public key.
    #[error("Invalid program ID: {0}")]
    InvalidProgramId(String),

    /// The explorer page has no IDL download link for the program.
    #[error("IDL not found for program {0}")]
    IdlNotFound(String),

    /// The explorer or the IDL download failed.
    #[error("Upstream fetch error: {0}")]
    UpstreamFetch(String),

    /// The on-disk IDL cache could not be read or written.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Errors related to file I/O, such as file not found or permission denied.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fallback for errors that don't fit into the above categories.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ViewerError {
    /// HTTP status used when this error is reported by the API server.
    pub fn status_code(&self) -> u16 {
        match self {
            ViewerError::InvalidFormat(_)
            | ViewerError::MissingRequiredField(_)
            | ViewerError::MissingProgramId
            | ViewerError::InvalidProgramId(_) => 400,
            ViewerError::IdlNotFound(_) => 404,
            ViewerError::UpstreamFetch(_)
            | ViewerError::Cache(_)
            | ViewerError::Io(_)
            | ViewerError::Unknown(_) => 500,
        }
    }

    /// Message shown to API clients. Upstream details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ViewerError::MissingProgramId => "Program ID is required".to_string(),
            ViewerError::IdlNotFound(_) => "IDL not found for this program".to_string(),
            ViewerError::UpstreamFetch(_) => "Failed to fetch IDL".to_string(),
            ViewerError::Cache(_) | ViewerError::Io(_) | ViewerError::Unknown(_) => {
                "Internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for the IDL viewer.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Where an error occurred.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Program ID being looked up, if applicable.
    pub program_id: Option<String>,

    /// Component where the error occurred (e.g., "explorer").
    pub component: String,

    /// Operation being performed when the error occurred (e.g., "find_idl_link").
    pub operation: String,

    /// Additional details, such as a URL or a path.
    pub details: Option<String>,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "In {} while {}", self.component, self.operation)?;
        if let Some(program_id) = &self.program_id {
            write!(f, " for program {}", program_id)?;
        }
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Extension trait for turning foreign errors into [`ViewerError`] with context.
pub trait ErrorExt<T> {
    /// Add context to an error.
    ///
    /// A [`ViewerError`] passes through unchanged; anything else is classified
    /// by its source type and wrapped with the context in the message.
    fn with_context(self, context: ErrorContext) -> ViewerResult<T>;

    /// Add the component and operation only.
    fn with_simple_context(self, component: &str, operation: &str) -> ViewerResult<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ErrorExt<T> for Result<T, E> {
    fn with_context(self, context: ErrorContext) -> ViewerResult<T> {
        self.map_err(|e| {
            let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(e);
            let boxed = match boxed.downcast::<ViewerError>() {
                Ok(viewer_err) => return *viewer_err,
                Err(other) => other,
            };
            let error_msg = format!("{}: {}", context, boxed);
            if boxed.is::<reqwest::Error>() {
                ViewerError::UpstreamFetch(error_msg)
            } else if boxed.is::<serde_json::Error>() {
                ViewerError::InvalidFormat(error_msg)
            } else if boxed.is::<std::io::Error>() {
                ViewerError::Io(std::io::Error::new(std::io::ErrorKind::Other, error_msg))
            } else {
                ViewerError::Unknown(error_msg)
            }
        })
    }

    fn with_simple_context(self, component: &str, operation: &str) -> ViewerResult<T> {
        self.with_context(ErrorContext {
            program_id: None,
            component: component.to_string(),
            operation: operation.to_string(),
            details: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ViewerError::MissingProgramId.status_code(), 400);
        assert_eq!(ViewerError::InvalidFormat("x".into()).status_code(), 400);
        assert_eq!(ViewerError::IdlNotFound("x".into()).status_code(), 404);
        assert_eq!(ViewerError::UpstreamFetch("x".into()).status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_upstream_details() {
        let err = ViewerError::UpstreamFetch("connection reset by 10.0.0.1".into());
        assert_eq!(err.public_message(), "Failed to fetch IDL");
        assert_eq!(
            ViewerError::IdlNotFound("abc".into()).public_message(),
            "IDL not found for this program"
        );
    }

    #[test]
    fn test_with_context_classifies_json_errors() {
        let parsed: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err = parsed
            .with_context(ErrorContext {
                program_id: Some("abc".into()),
                component: "cache".into(),
                operation: "read".into(),
                details: None,
            })
            .unwrap_err();
        match err {
            ViewerError::InvalidFormat(msg) => {
                assert!(msg.starts_with("In cache while read for program abc"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_with_context_keeps_viewer_errors() {
        let result: Result<(), ViewerError> = Err(ViewerError::MissingProgramId);
        let err = result.with_simple_context("explorer", "lookup").unwrap_err();
        assert!(matches!(err, ViewerError::MissingProgramId));
    }
}
