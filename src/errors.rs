use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Caller supplied input that cannot be processed.
    InvalidInput(String),
    /// An operation needs a provider credential that is not configured.
    MissingCredentials(String),
    /// The remote provider answered 429.
    RateLimited(String),
    /// Error interacting with an external API (transport or non-2xx).
    ExternalApiError(String),
    /// The remote provider answered 2xx with a body we cannot use.
    MalformedResponse(String),
    /// Structurally unreadable CSV input or output.
    CsvError(String),
    /// Filesystem or stream error.
    IoError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// True for the errors a remote call may produce and that callers are
    /// expected to absorb with a local fallback.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::RateLimited(_)
            | AppError::ExternalApiError(_)
            | AppError::MalformedResponse(_)
            | AppError::MissingCredentials(_) => true,
            AppError::WithContext { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::MissingCredentials(msg) => write!(f, "Missing credentials: {}", msg),
            AppError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            AppError::CsvError(msg) => write!(f, "CSV error: {}", msg),
            AppError::IoError(msg) => write!(f, "I/O error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApiError(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::CsvError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for csv::Error to add context
impl<T> ResultExt<T> for Result<T, csv::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::from(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::from(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_chain_display() {
        let err: Result<(), AppError> = Err(AppError::CsvError("bad header".to_string()));
        let err = err.context("Failed to parse CSV").unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse CSV: CSV error: bad header");
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::RateLimited("429".into()).is_transient());
        assert!(AppError::MalformedResponse("x".into()).is_transient());
        assert!(!AppError::CsvError("x".into()).is_transient());

        let wrapped = AppError::WithContext {
            source: Box::new(AppError::ExternalApiError("timeout".into())),
            context: "verify".into(),
        };
        assert!(wrapped.is_transient());
    }
}
