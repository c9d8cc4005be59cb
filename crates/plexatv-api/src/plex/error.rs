use thiserror::Error;

/// Errors from the Plex fetcher.
#[derive(Debug, Error)]
pub enum PlexError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The server (or plex.tv) could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// Credentials were rejected.
    #[error("auth error: {0}")]
    Auth(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("server not found on account: {0}")]
    ServerNotFound(String),
}

impl From<reqwest::Error> for PlexError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Connection(e.to_string())
        } else {
            Self::Http(e)
        }
    }
}

impl PlexError {
    /// Map a non-success HTTP status to the matching error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Auth(format!("status {status}: {message}")),
            _ => Self::Api { status, message },
        }
    }
}
