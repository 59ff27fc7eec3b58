use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokenError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("encoding failed: {0}")]
    Encoding(String),
    #[error("malformed input: {0}")]
    Format(String),
}
