use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote fetch error: {0}")]
    RemoteFetch(String),

    #[error("Entity {0} not found in remote catalog")]
    NotFound(i64),

    #[error("Overlay corrupt: {0}")]
    OverlayCorrupt(String),

    #[error("Overlay write error: {0}")]
    OverlayWrite(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// True for failures of the remote catalog, which `load` recovers from
    /// by falling back to the overlay.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteFetch(_) | Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteFetch(err.to_string())
    }
}
