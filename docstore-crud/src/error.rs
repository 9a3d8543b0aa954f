//! Error types and HTTP status mapping

use http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docstore-crud
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment could not be loaded
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// A collection schema or wiring is invalid; not recoverable at request time
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Empty or invalid payload, or an ambiguous route declaration
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No document matched the request
    #[error("No document found in collection '{collection}'")]
    NotFound {
        /// Collection that was searched
        collection: String,
    },

    /// The operation is not valid for the effective options
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Document store failure, propagated unmodified
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// Build a `NotFound` error naming the collection
    pub fn not_found(collection: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
        }
    }

    /// HTTP status code a routing layer should answer with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) | Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            Self::Store(err) => match err {
                StoreError::AlreadyExists { .. } => StatusCode::CONFLICT,
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
                StoreError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
                StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    /// Machine-readable error code (e.g. "NOT_FOUND")
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
