//! The Griz code service: cache-aside resolution of hash tokens and social
//! links, code and user management, sessions and QR downloads.

mod auth_token;
mod config;
mod error;
mod password;
mod qr;
mod service;

pub use auth_token::{AuthClaims, AuthTokenIssuer};
pub use config::{
    ServiceConfig, DEFAULT_CACHE_TTL, DEFAULT_RESOLVE_TIMEOUT, DEFAULT_SOCIAL_RESOLVE_TIMEOUT,
};
pub use error::{Result, ServiceError};
pub use password::PasswordHasher;
pub use qr::{QrEncoder, DEFAULT_MODULE_SIZE};
pub use service::{CodeService, UserProfile};
