use jiff::Timestamp;
use serde::{Deserialize, Serialize};

pub type CodeId = u64;
pub type UserId = u64;

/// One shortened link.
///
/// `hash` is `None` between the insert of a new row and the moment the
/// token derived from its id is written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub id: CodeId,
    pub user_id: UserId,
    pub source_url: String,
    pub hash: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields supplied by the owner when registering a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCode {
    pub user_id: UserId,
    pub source_url: String,
}

/// A stored account. `password` always holds the keyed digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// A username paired with a password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}
