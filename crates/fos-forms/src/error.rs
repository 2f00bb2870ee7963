//! Form Errors
//!
//! Fail-fast errors raised while building, populating or binding a form tree.
//! Validation failures are not errors; they travel as element messages.

/// Form error
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Input whose shape is fundamentally wrong
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Well-formed input that violates a stateful policy
    #[error("Domain error: {0}")]
    Domain(String),

    /// A required child lookup failed
    #[error("No element by the name of \"{0}\" found")]
    NotFound(String),

    /// A declarative spec could not be deserialized
    #[error("Invalid specification: {0}")]
    Spec(#[from] serde_json::Error),
}

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Domain,
    NotFound,
}

impl FormError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::Spec(_) => ErrorKind::InvalidArgument,
            Self::Domain(_) => ErrorKind::Domain,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(FormError::invalid("x").kind(), ErrorKind::InvalidArgument);
        assert_eq!(FormError::domain("x").kind(), ErrorKind::Domain);
        assert_eq!(FormError::NotFound("a".into()).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_spec_error_is_invalid_argument() {
        let err: FormError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_not_found_message() {
        let err = FormError::NotFound("email".into());
        assert_eq!(err.to_string(), "No element by the name of \"email\" found");
    }
}
