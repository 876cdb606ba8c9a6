/// Error returned by the remote rendering provider's HTTP surface.
///
/// `Status` covers non-success HTTP responses with a best-effort message
/// extracted from the body; `Transport` covers failures where no response was
/// obtained at all (DNS, connect, timeout). The poller treats `Transport` as
/// transient and keeps going until its attempt budget runs out.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => Self::Transport(err.to_string()),
        }
    }
}

/// Cache storage failure. Always non-fatal: a failed read degrades to a cache
/// miss and a failed write degrades to rendered-but-not-cached. Surfaced only
/// in logs and diagnostics, never to the render caller.
#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError(err.to_string())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
pub type StorageResult<T> = Result<T, StorageError>;
