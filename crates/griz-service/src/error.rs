use griz_core::{CacheError, SourceError, StorageError};
use griz_resolver::ResolveError;
use griz_token::TokenError;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("code not found: {0}")]
    CodeNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("wrong credentials")]
    WrongCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("malformed input: {0}")]
    Format(String),
    #[error("photo source failed: {0}")]
    Source(#[source] SourceError),
    #[error("{0}")]
    QrNotFound(String),
    #[error("{operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: StorageError,
    },
    #[error("{operation}: {source}")]
    Cache {
        operation: &'static str,
        #[source]
        source: CacheError,
    },
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error("failed to issue auth token: {0}")]
    AuthToken(String),
    #[error("failed to render QR code: {0}")]
    QrEncode(String),
}

impl ServiceError {
    /// Whether the requested code, user or QR payload does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CodeNotFound(_) | Self::UserNotFound(_) | Self::QrNotFound(_)
        )
    }
}

impl From<TokenError> for ServiceError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidArgument(msg) | TokenError::Encoding(msg) => {
                Self::InvalidArgument(msg)
            }
            TokenError::Format(msg) => Self::Format(msg),
        }
    }
}

impl From<ResolveError> for ServiceError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Source(SourceError::InvalidReference(msg)) => Self::InvalidArgument(msg),
            ResolveError::Source(source) => Self::Source(source),
            ResolveError::NotFound(msg) => Self::QrNotFound(msg),
        }
    }
}

/// Maps a repository failure, keeping absent rows distinguishable.
pub(crate) fn storage_error(operation: &'static str) -> impl FnOnce(StorageError) -> ServiceError {
    move |e| match e {
        StorageError::CodeNotFound(msg) => ServiceError::CodeNotFound(msg),
        StorageError::UserNotFound(msg) => ServiceError::UserNotFound(msg),
        source => ServiceError::Storage { operation, source },
    }
}

pub(crate) fn cache_error(operation: &'static str) -> impl FnOnce(CacheError) -> ServiceError {
    move |source| ServiceError::Cache { operation, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_keep_their_kind() {
        let err: ServiceError = TokenError::InvalidArgument("zero".into()).into();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));

        let err: ServiceError = TokenError::Format("not hex".into()).into();
        assert!(matches!(err, ServiceError::Format(_)));
    }

    #[test]
    fn resolve_errors_keep_their_kind() {
        let err: ServiceError = ResolveError::NotFound("unable to find QR".into()).into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "unable to find QR");

        let err: ServiceError =
            ResolveError::Source(SourceError::InvalidReference("x".into())).into();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));

        let err: ServiceError = ResolveError::Source(SourceError::Status {
            status: 503,
            url: "https://cdn/a.jpg".into(),
        })
        .into();
        assert!(matches!(err, ServiceError::Source(_)));
    }

    #[test]
    fn storage_errors_carry_the_operation() {
        let err = storage_error("create_code")(StorageError::Unavailable("refused".into()));
        assert_eq!(
            err.to_string(),
            "create_code: storage backend unavailable: refused"
        );
        assert!(!err.is_not_found());

        let err = storage_error("get_code")(StorageError::CodeNotFound("id 7".into()));
        assert!(matches!(err, ServiceError::CodeNotFound(_)));
        assert!(err.is_not_found());
    }
}
