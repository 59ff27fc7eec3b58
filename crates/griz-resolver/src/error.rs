use griz_core::SourceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Listing the candidate photos failed.
    #[error("photo source failed: {0}")]
    Source(#[from] SourceError),
    /// No candidate produced a QR payload.
    #[error("{0}")]
    NotFound(String),
}
