use thiserror::Error;

#[derive(Error, Debug)]
pub enum UiError {
    #[error("No authentication token available")]
    AuthError,

    #[error("API error: {status} {status_text}")]
    HttpError { status: u16, status_text: String },

    #[error("API request failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("DOM operation failed: {message}")]
    DomError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    Http,
    Network,
    Config,
    Page,
}

impl UiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UiError::AuthError => ErrorCategory::Auth,
            UiError::HttpError { .. } => ErrorCategory::Http,
            UiError::TransportError(_) | UiError::SerializationError(_) => ErrorCategory::Network,
            UiError::IoError(_)
            | UiError::ConfigError { .. }
            | UiError::InvalidConfigValueError { .. }
            | UiError::MissingConfigError { .. } => ErrorCategory::Config,
            UiError::ElementNotFound { .. }
            | UiError::InvalidSelector { .. }
            | UiError::DomError { .. } => ErrorCategory::Page,
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UiError::HttpError { status, .. } => Some(*status),
            UiError::TransportError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Auth => "Sign in again or pass a token with --token / RULESET_TOKEN",
            ErrorCategory::Http => "Check the ruleset/rule IDs and your permissions, then retry the action",
            ErrorCategory::Network => "Check that the server is reachable at the configured base URL",
            ErrorCategory::Config => "Fix the configuration file or command line flags",
            ErrorCategory::Page => "Make sure the page contains the expected containers",
        }
    }
}

pub type Result<T> = std::result::Result<T, UiError>;
