use crate::error::StorageError;
use crate::model::{Code, CodeId, Credentials, NewCode, NewUser, User, UserId};
use async_trait::async_trait;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable storage for codes.
///
/// Lookups of absent rows fail with [`StorageError::CodeNotFound`].
#[async_trait]
pub trait CodeRepository: Send + Sync + 'static {
    /// Inserts a new code without a hash and returns its assigned id.
    async fn create(&self, code: NewCode) -> Result<CodeId>;

    async fn get(&self, id: CodeId) -> Result<Code>;

    async fn get_by_hash(&self, hash: &str) -> Result<Code>;

    /// Replaces the mutable part of the row (`source_url`, `hash`) and bumps
    /// `updated_at`. The owner and creation time are kept.
    async fn update(&self, code: &Code) -> Result<()>;

    async fn delete(&self, id: CodeId) -> Result<()>;

    /// Returns every code owned by `user_id`, ordered by id. Empty if none.
    async fn list_all(&self, user_id: UserId) -> Result<Vec<Code>>;

    /// Returns one page of the codes owned by `user_id`, ordered by id.
    async fn list(&self, user_id: UserId, offset: u64, limit: u64) -> Result<Vec<Code>>;
}

/// Durable storage for accounts.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Inserts a user. Fails with [`StorageError::Conflict`] on a taken username.
    async fn create(&self, user: NewUser) -> Result<UserId>;

    async fn get(&self, id: UserId) -> Result<User>;

    /// Returns the id of the user matching both username and password digest.
    ///
    /// An unknown username and a wrong digest fail identically with
    /// [`StorageError::UserNotFound`].
    async fn get_by_username_and_pass(&self, credentials: &Credentials) -> Result<UserId>;
}

#[async_trait]
impl<T: CodeRepository + ?Sized> CodeRepository for Arc<T> {
    async fn create(&self, code: NewCode) -> Result<CodeId> {
        (**self).create(code).await
    }

    async fn get(&self, id: CodeId) -> Result<Code> {
        (**self).get(id).await
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Code> {
        (**self).get_by_hash(hash).await
    }

    async fn update(&self, code: &Code) -> Result<()> {
        (**self).update(code).await
    }

    async fn delete(&self, id: CodeId) -> Result<()> {
        (**self).delete(id).await
    }

    async fn list_all(&self, user_id: UserId) -> Result<Vec<Code>> {
        (**self).list_all(user_id).await
    }

    async fn list(&self, user_id: UserId, offset: u64, limit: u64) -> Result<Vec<Code>> {
        (**self).list(user_id, offset, limit).await
    }
}

#[async_trait]
impl<T: UserRepository + ?Sized> UserRepository for Arc<T> {
    async fn create(&self, user: NewUser) -> Result<UserId> {
        (**self).create(user).await
    }

    async fn get(&self, id: UserId) -> Result<User> {
        (**self).get(id).await
    }

    async fn get_by_username_and_pass(&self, credentials: &Credentials) -> Result<UserId> {
        (**self).get_by_username_and_pass(credentials).await
    }
}
