use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use griz_core::repository::Result;
use griz_core::{
    Code, CodeId, CodeRepository, Credentials, NewCode, NewUser, StorageError, User, UserId,
    UserRepository,
};
use jiff::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

fn code_not_found(id: CodeId) -> StorageError {
    StorageError::CodeNotFound(format!("id {id}"))
}

/// Codes kept in a sharded concurrent map.
///
/// Ids are assigned from a counter starting at 1, so they are never 0 and
/// never reused.
#[derive(Debug)]
pub struct InMemoryCodeRepository {
    codes: DashMap<CodeId, Code>,
    last_id: AtomicU64,
}

impl InMemoryCodeRepository {
    pub fn new() -> Self {
        Self {
            codes: DashMap::new(),
            last_id: AtomicU64::new(0),
        }
    }

    fn owned_by(&self, user_id: UserId) -> Vec<Code> {
        let mut codes: Vec<Code> = self
            .codes
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        codes.sort_by_key(|code| code.id);
        codes
    }
}

impl Default for InMemoryCodeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeRepository for InMemoryCodeRepository {
    async fn create(&self, code: NewCode) -> Result<CodeId> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Timestamp::now();
        self.codes.insert(
            id,
            Code {
                id,
                user_id: code.user_id,
                source_url: code.source_url,
                hash: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn get(&self, id: CodeId) -> Result<Code> {
        self.codes
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| code_not_found(id))
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Code> {
        self.codes
            .iter()
            .find(|entry| entry.hash.as_deref() == Some(hash))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::CodeNotFound(format!("hash {hash}")))
    }

    async fn update(&self, code: &Code) -> Result<()> {
        let mut stored = self
            .codes
            .get_mut(&code.id)
            .ok_or_else(|| code_not_found(code.id))?;
        stored.source_url = code.source_url.clone();
        stored.hash = code.hash.clone();
        stored.updated_at = Timestamp::now();
        Ok(())
    }

    async fn delete(&self, id: CodeId) -> Result<()> {
        self.codes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| code_not_found(id))
    }

    async fn list_all(&self, user_id: UserId) -> Result<Vec<Code>> {
        Ok(self.owned_by(user_id))
    }

    async fn list(&self, user_id: UserId, offset: u64, limit: u64) -> Result<Vec<Code>> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .owned_by(user_id)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }
}

/// Users kept in memory, with a secondary index on username.
#[derive(Debug)]
pub struct InMemoryUserRepository {
    users: DashMap<UserId, User>,
    usernames: DashMap<String, UserId>,
    last_id: AtomicU64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            usernames: DashMap::new(),
            last_id: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<UserId> {
        // the username entry stays locked until the user row is in place
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(format!(
                "username '{}' is taken",
                user.username
            ))),
            Entry::Vacant(slot) => {
                let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                self.users.insert(
                    id,
                    User {
                        id,
                        username: user.username,
                        password: user.password,
                        email: user.email,
                    },
                );
                slot.insert(id);
                Ok(id)
            }
        }
    }

    async fn get(&self, id: UserId) -> Result<User> {
        self.users
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::UserNotFound(format!("id {id}")))
    }

    async fn get_by_username_and_pass(&self, credentials: &Credentials) -> Result<UserId> {
        let not_found = || StorageError::UserNotFound(credentials.username.clone());

        let id = *self
            .usernames
            .get(&credentials.username)
            .ok_or_else(not_found)?;
        let user = self.users.get(&id).ok_or_else(not_found)?;
        if user.password != credentials.password {
            return Err(not_found());
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_code(user_id: UserId, url: &str) -> NewCode {
        NewCode {
            user_id,
            source_url: url.to_string(),
        }
    }

    fn new_user(name: &str, password: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password: password.to_string(),
            email: format!("{name}@example.com"),
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids_from_one() {
        let repo = InMemoryCodeRepository::new();
        let first = repo.create(new_code(1, "https://a.example")).await.unwrap();
        let second = repo.create(new_code(1, "https://b.example")).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let code = repo.get(first).await.unwrap();
        assert_eq!(code.source_url, "https://a.example");
        assert_eq!(code.hash, None);
        assert_eq!(code.created_at, code.updated_at);
    }

    #[tokio::test]
    async fn get_missing_code() {
        let repo = InMemoryCodeRepository::new();
        let err = repo.get(7).await.unwrap_err();
        assert!(matches!(err, StorageError::CodeNotFound(_)));
    }

    #[tokio::test]
    async fn update_then_get_by_hash() {
        let repo = InMemoryCodeRepository::new();
        let id = repo.create(new_code(3, "https://a.example")).await.unwrap();

        let mut code = repo.get(id).await.unwrap();
        code.hash = Some("v01abc".to_string());
        code.source_url = "https://b.example".to_string();
        // owner changes are ignored
        code.user_id = 99;
        repo.update(&code).await.unwrap();

        let stored = repo.get_by_hash("v01abc").await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.user_id, 3);
        assert_eq!(stored.source_url, "https://b.example");
        assert!(stored.updated_at >= stored.created_at);

        let err = repo.get_by_hash("v01zzz").await.unwrap_err();
        assert!(matches!(err, StorageError::CodeNotFound(_)));
    }

    #[tokio::test]
    async fn update_missing_code() {
        let repo = InMemoryCodeRepository::new();
        let now = Timestamp::now();
        let code = Code {
            id: 5,
            user_id: 1,
            source_url: "https://a.example".to_string(),
            hash: None,
            created_at: now,
            updated_at: now,
        };
        let err = repo.update(&code).await.unwrap_err();
        assert!(matches!(err, StorageError::CodeNotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_code() {
        let repo = InMemoryCodeRepository::new();
        let id = repo.create(new_code(1, "https://a.example")).await.unwrap();

        repo.delete(id).await.unwrap();
        assert!(repo.get(id).await.unwrap_err().is_not_found());
        assert!(repo.delete(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = InMemoryCodeRepository::new();
        let id = repo.create(new_code(1, "https://a.example")).await.unwrap();
        repo.delete(id).await.unwrap();
        let next = repo.create(new_code(1, "https://b.example")).await.unwrap();
        assert_ne!(id, next);
    }

    #[tokio::test]
    async fn list_all_filters_by_owner() {
        let repo = InMemoryCodeRepository::new();
        repo.create(new_code(1, "https://a.example")).await.unwrap();
        repo.create(new_code(2, "https://b.example")).await.unwrap();
        repo.create(new_code(1, "https://c.example")).await.unwrap();

        let urls: Vec<String> = repo
            .list_all(1)
            .await
            .unwrap()
            .into_iter()
            .map(|code| code.source_url)
            .collect();
        assert_eq!(urls, ["https://a.example", "https://c.example"]);

        assert!(repo.list_all(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_pages_in_id_order() {
        let repo = InMemoryCodeRepository::new();
        for i in 0..5 {
            repo.create(new_code(1, &format!("https://{i}.example")))
                .await
                .unwrap();
        }

        let page: Vec<CodeId> = repo
            .list(1, 1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|code| code.id)
            .collect();
        assert_eq!(page, [2, 3]);

        assert!(repo.list(1, 10, 2).await.unwrap().is_empty());
        assert!(repo.list(1, 0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let repo = Arc::new(InMemoryCodeRepository::new());

        let mut handles = vec![];
        for i in 0..20 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.create(new_code(1, &format!("https://{i}.example")))
                    .await
                    .unwrap()
            }));
        }

        let mut ids = vec![];
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn user_create_and_get() {
        let repo = InMemoryUserRepository::new();
        let id = repo.create(new_user("alice", "digest")).await.unwrap();
        assert_eq!(id, 1);

        let user = repo.get(id).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");

        let err = repo.get(2).await.unwrap_err();
        assert!(matches!(err, StorageError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("alice", "a")).await.unwrap();

        let err = repo.create(new_user("alice", "b")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn credentials_lookup() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("alice", "a")).await.unwrap();
        let bob = repo.create(new_user("bob", "b")).await.unwrap();

        let found = repo
            .get_by_username_and_pass(&Credentials {
                username: "bob".to_string(),
                password: "b".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(found, bob);

        let wrong_pass = repo
            .get_by_username_and_pass(&Credentials {
                username: "bob".to_string(),
                password: "a".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = repo
            .get_by_username_and_pass(&Credentials {
                username: "carol".to_string(),
                password: "b".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong_pass, StorageError::UserNotFound(_)));
        assert!(matches!(unknown, StorageError::UserNotFound(_)));
    }
}
