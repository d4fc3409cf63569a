use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No login credential found: a session cookie with a ctoken is required")]
    MissingCredential,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP request failed with status {0}")]
    HttpStatus(u16),

    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Scan aborted by operator while listing '{0}'")]
    ScanAborted(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Failures a read may be retried on: the request never produced an
    /// answer, or the server answered with a status that usually clears up.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Timeout(_) => true,
            Error::HttpStatus(status) => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else if err.is_decode() {
            Error::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Error::HttpStatus(status.as_u16())
        } else {
            Error::Transport(err.to_string())
        }
    }
}
