use http::uri::InvalidUri;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidUri(#[from] InvalidUri),

    #[error("This storage provider does not support presigned URIs")]
    PresignedUriNotSupported,

    #[error("Missing field {0}")]
    MissingField(&'static str),

    #[error("Object storage failure: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Creating presigned url: {0}")]
    PresignedUriCreation(String),
}

impl Error {
    /// True when the failure is just the object not being there.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ObjectStore(object_store::Error::NotFound { .. })
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
