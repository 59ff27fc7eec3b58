//! Core types and traits for the Griz link/QR service.
//!
//! This crate provides the entities and the collaborator contracts
//! (cache, repositories, photo source, QR decoder) shared by the
//! storage, cache, resolver and service crates.

pub mod cache;
pub mod error;
pub mod model;
pub mod repository;
pub mod source;

pub use cache::{Cache, CacheKey};
pub use error::{CacheError, DecodeError, SourceError, StorageError};
pub use model::{Code, CodeId, Credentials, NewCode, NewUser, User, UserId};
pub use repository::{CodeRepository, UserRepository};
pub use source::{PhotoSourcer, QrDecoder};
