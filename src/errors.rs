use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("HTTP error {status} while loading {url}")]
    HttpError { status: u16, url: String },

    #[error("Too many redirects (limit {limit}) while loading {url}")]
    TooManyRedirects { limit: usize, url: String },

    #[error("No form control named '{0}'")]
    ControlNotFound(String),

    #[error("Invalid control state: {0}")]
    InvalidControlState(String),

    #[error("No previous document in history")]
    NoHistory,

    #[error("No document has been opened yet")]
    NoDocument,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Handle does not belong to the current document: {0}")]
    StaleHandle(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Too many elements found: {0}")]
    TooManyElements(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BrowserError>;

impl BrowserError {
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        BrowserError::TransportError(err.to_string())
    }

    /// Whether the error came from the network or the server rather than
    /// from the caller misusing a form or a handle.
    pub fn is_navigation_error(&self) -> bool {
        matches!(
            self,
            BrowserError::TransportError(_)
                | BrowserError::HttpError { .. }
                | BrowserError::TooManyRedirects { .. }
        )
    }
}
