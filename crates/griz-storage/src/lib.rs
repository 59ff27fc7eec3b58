//! Repository implementations for codes and users.

mod memory;
mod mysql;

pub use griz_core::StorageError;
pub use memory::{InMemoryCodeRepository, InMemoryUserRepository};
pub use mysql::{MySqlCodeRepository, MySqlUserRepository};

/// Schema for the MySQL repositories, one statement per table.
pub const MYSQL_SCHEMA: [&str; 2] = [
    include_str!("../ddl/mysql/users.sql"),
    include_str!("../ddl/mysql/codes.sql"),
];
