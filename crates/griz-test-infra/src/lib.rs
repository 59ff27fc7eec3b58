//! Disposable MySQL and Redis servers for the storage and cache integration
//! tests.
//!
//! Each fixture owns its container. Dropping the fixture stops it.

mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};
