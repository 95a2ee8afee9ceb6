use thiserror::Error;

/// Errors surfaced by web-context commands
#[derive(Debug, Error)]
pub enum Error {
    /// A required native element never appeared
    #[error("An element could not be located on the page using the given search parameters: {0}")]
    ElementNotFound(String),

    /// A blocking dialog was detected before or during an atom
    #[error("Unexpected alert open: {0}")]
    UnexpectedAlertOpen(String),

    /// The browser-side atom failed
    #[error("Error while executing atom: {0}")]
    AtomExecution(String),

    /// A script or atom envelope reported a non-zero status
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// The native agent proxy rejected a command
    #[error("Proxy command {path} failed: {message}")]
    Proxy { path: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Session {0} not found")]
    NoSuchSession(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn proxy(path: &str, message: impl Into<String>) -> Self {
        Self::Proxy {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// W3C error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ElementNotFound(_) => "no such element",
            Self::UnexpectedAlertOpen(_) => "unexpected alert open",
            Self::AtomExecution(_) | Self::JavaScript(_) => "javascript error",
            Self::InvalidArgument(_) | Self::Json(_) => "invalid argument",
            Self::NoSuchSession(_) => "invalid session id",
            Self::Proxy { .. } | Self::Config(_) | Self::Io(_) => "unknown error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
