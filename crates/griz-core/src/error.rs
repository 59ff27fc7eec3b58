use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("code not found: {0}")]
    CodeNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Whether this error reports an absent code or user row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CodeNotFound(_) | Self::UserNotFound(_))
    }
}

/// Failure of an upstream collaborator that lists or downloads photos.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("reference is malformed: {0}")]
    InvalidReference(String),
    #[error("upstream request failed: {0}")]
    Request(String),
    #[error("upstream responded with status {status}: {url}")]
    Status { status: u16, url: String },
    #[error("upstream response could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("bytes are not a supported image: {0}")]
    Image(String),
    #[error("no QR code found in image")]
    NoCode,
    #[error("QR code could not be read: {0}")]
    Unreadable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_covers_codes_and_users() {
        assert!(StorageError::CodeNotFound("id 1".into()).is_not_found());
        assert!(StorageError::UserNotFound("alice".into()).is_not_found());
        assert!(!StorageError::Conflict("alice".into()).is_not_found());
        assert!(!StorageError::Query("syntax".into()).is_not_found());
    }
}
