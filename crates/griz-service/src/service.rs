use crate::auth_token::AuthTokenIssuer;
use crate::config::ServiceConfig;
use crate::error::{cache_error, storage_error, Result, ServiceError};
use crate::password::PasswordHasher;
use crate::qr::QrEncoder;
use griz_core::{
    Cache, CacheError, CacheKey, Code, CodeId, CodeRepository, Credentials, NewCode, NewUser,
    StorageError, UserId, UserRepository,
};
use griz_resolver::QrSource;
use griz_token::{build_link, extract_hash, TokenCodec};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Public view of an account. The password digest never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// Cache-aside orchestration over the code and user repositories.
///
/// Reads go to the cache first and fall back to the repository on a miss,
/// populating the cache on the way out. Writes go to the repository first
/// and are then mirrored into the cache. A failing cache is an error, never
/// a miss.
///
/// The service holds no per-call state; share it behind an `Arc`.
#[derive(TypedBuilder)]
pub struct CodeService<C, CR, UR, Q> {
    #[builder(default)]
    config: ServiceConfig,
    cache: C,
    codes: CR,
    users: UR,
    qr_source: Q,
    codec: TokenCodec,
    passwords: PasswordHasher,
    auth_tokens: AuthTokenIssuer,
    #[builder(default)]
    qr_encoder: QrEncoder,
}

async fn with_deadline<T>(
    operation: &'static str,
    after: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| ServiceError::Timeout { operation, after })?
}

impl<C, CR, UR, Q> CodeService<C, CR, UR, Q>
where
    C: Cache,
    CR: CodeRepository,
    UR: UserRepository,
    Q: QrSource,
{
    /// Returns the source URL behind a hash token.
    pub async fn find_code_by_hash(&self, hash: &str) -> Result<String> {
        trace!(hash = %hash, "Resolving hash");
        with_deadline(
            "find_code_by_hash",
            self.config.resolve_timeout,
            self.resolve_hash(hash),
        )
        .await
    }

    async fn resolve_hash(&self, hash: &str) -> Result<String> {
        const OP: &str = "find_code_by_hash";
        let key = CacheKey::HashUrl(hash);

        if let Some(url) = self.cache.get(&key).await.map_err(cache_error(OP))? {
            debug!(hash = %hash, "Hash resolved from cache");
            return Ok(url);
        }

        debug!(hash = %hash, "Hash not cached, reading repository");
        let code = self
            .codes
            .get_by_hash(hash)
            .await
            .map_err(storage_error(OP))?;

        self.cache
            .set(&key, &code.source_url, Some(self.config.hash_ttl))
            .await
            .map_err(cache_error(OP))?;
        Ok(code.source_url)
    }

    /// Returns the source URL of the code whose QR appears on a social post.
    pub async fn find_code_by_social(&self, link: &str) -> Result<String> {
        trace!(link = %link, "Resolving social link");
        with_deadline(
            "find_code_by_social",
            self.config.social_resolve_timeout,
            self.resolve_social(link),
        )
        .await
    }

    async fn resolve_social(&self, link: &str) -> Result<String> {
        const OP: &str = "find_code_by_social";
        let key = CacheKey::SocialUrl(link);

        // holds the hash token; the URL always comes from resolve_hash
        if let Some(hash) = self.cache.get(&key).await.map_err(cache_error(OP))? {
            debug!(link = %link, hash = %hash, "Social link resolved from cache");
            return self.resolve_hash(&hash).await;
        }

        let payload = self.qr_source.first_qr(link).await?;
        let payload = String::from_utf8(payload)
            .map_err(|_| ServiceError::Format("QR payload is not UTF-8 text".to_string()))?;
        let hash = extract_hash(&payload)?;
        debug!(link = %link, hash = %hash, "Found QR on social post");

        let url = self.resolve_hash(&hash).await?;
        self.cache
            .set(&key, &hash, Some(self.config.social_link_ttl))
            .await
            .map_err(cache_error(OP))?;
        Ok(url)
    }

    /// Stores a new code, derives its hash token and caches its source URL.
    ///
    /// The row is removed again if the token cannot be derived or written
    /// back, so no code is ever left without a hash.
    pub async fn create_code(&self, code: NewCode) -> Result<CodeId> {
        const OP: &str = "create_code";

        let id = self.codes.create(code).await.map_err(storage_error(OP))?;
        let stored = match self.attach_hash(id).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(id, error = %e, "Failed to attach hash, removing code");
                if let Err(rollback) = self.codes.delete(id).await {
                    warn!(id, error = %rollback, "Failed to remove code without hash");
                }
                return Err(e);
            }
        };

        if let Some(hash) = stored.hash.as_deref() {
            self.cache
                .set(
                    &CacheKey::HashUrl(hash),
                    &stored.source_url,
                    Some(self.config.hash_ttl),
                )
                .await
                .map_err(cache_error(OP))?;
        }
        debug!(id, "Created code");
        Ok(id)
    }

    async fn attach_hash(&self, id: CodeId) -> Result<Code> {
        const OP: &str = "create_code";

        let hash = self.codec.encode(id)?;
        let mut stored = self.codes.get(id).await.map_err(storage_error(OP))?;
        stored.hash = Some(hash);
        self.codes.update(&stored).await.map_err(storage_error(OP))?;
        Ok(stored)
    }

    /// Persists a changed source URL, then refreshes the cached entry.
    pub async fn update_code(&self, code: &Code) -> Result<()> {
        const OP: &str = "update_code";
        let hash = self.hash_of(code)?;

        self.codes.update(code).await.map_err(storage_error(OP))?;
        self.cache
            .set(
                &CacheKey::HashUrl(hash),
                &code.source_url,
                Some(self.config.hash_ttl),
            )
            .await
            .map_err(cache_error(OP))?;
        debug!(id = code.id, "Updated code");
        Ok(())
    }

    /// Deletes the row, then evicts its cached entry.
    pub async fn delete_code(&self, code: &Code) -> Result<()> {
        const OP: &str = "delete_code";

        self.codes.delete(code.id).await.map_err(storage_error(OP))?;
        if let Some(hash) = code.hash.as_deref() {
            self.cache
                .del(&CacheKey::HashUrl(hash))
                .await
                .map_err(cache_error(OP))?;
        }
        debug!(id = code.id, "Deleted code");
        Ok(())
    }

    /// The hash of `code`, which must be the token derived from its id.
    fn hash_of<'a>(&self, code: &'a Code) -> Result<&'a str> {
        let hash = code
            .hash
            .as_deref()
            .ok_or_else(|| ServiceError::InvalidArgument(format!("code {} has no hash", code.id)))?;
        if self.codec.decode(hash)? != code.id {
            return Err(ServiceError::InvalidArgument(format!(
                "hash '{hash}' does not belong to code {}",
                code.id
            )));
        }
        Ok(hash)
    }

    pub async fn get_code(&self, id: CodeId) -> Result<Code> {
        self.codes.get(id).await.map_err(storage_error("get_code"))
    }

    /// Every code owned by `user_id`. Empty when the user has none.
    pub async fn get_codes(&self, user_id: UserId) -> Result<Vec<Code>> {
        self.codes
            .list_all(user_id)
            .await
            .map_err(storage_error("get_codes"))
    }

    pub async fn list_codes(&self, user_id: UserId, offset: u64, limit: u64) -> Result<Vec<Code>> {
        if limit == 0 {
            return Err(ServiceError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }
        self.codes
            .list(user_id, offset, limit)
            .await
            .map_err(storage_error("list_codes"))
    }

    /// Base64 PNG of the QR code pointing at the deep link for `hash`.
    pub async fn download_code_by_hash(&self, hash: &str) -> Result<String> {
        self.codec.decode(hash)?;
        self.qr_encoder.png_base64(&build_link(hash))
    }

    /// Registers an account. The password is stored as its keyed digest.
    pub async fn create_user(&self, user: NewUser) -> Result<UserId> {
        if user.username.is_empty() || user.password.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "username and password are required".to_string(),
            ));
        }

        let user = NewUser {
            password: self.passwords.digest(&user.password),
            ..user
        };
        let id = self
            .users
            .create(user)
            .await
            .map_err(storage_error("create_user"))?;
        debug!(id, "Created user");
        Ok(id)
    }

    pub async fn get_user(&self, id: UserId) -> Result<UserProfile> {
        let user = self.users.get(id).await.map_err(storage_error("get_user"))?;
        Ok(UserProfile {
            id: user.id,
            username: user.username,
            email: user.email,
        })
    }

    /// Checks a username and password and opens a session for the user.
    pub async fn create_auth_token(&self, username: &str, password: &str) -> Result<String> {
        const OP: &str = "create_auth_token";

        let credentials = Credentials {
            username: username.to_string(),
            password: self.passwords.digest(password),
        };
        let id = match self.users.get_by_username_and_pass(&credentials).await {
            Ok(id) => id,
            Err(StorageError::UserNotFound(_)) => return Err(ServiceError::WrongCredentials),
            Err(e) => return Err(storage_error(OP)(e)),
        };

        let token = self.auth_tokens.issue(id, self.config.auth_token_ttl)?;
        self.cache
            .set(
                &CacheKey::AuthToken(&token),
                &id.to_string(),
                Some(self.config.auth_token_ttl),
            )
            .await
            .map_err(cache_error(OP))?;
        debug!(id, "Issued auth token");
        Ok(token)
    }

    /// Returns the user a live session token belongs to.
    pub async fn get_user_id_by_auth_token(&self, token: &str) -> Result<UserId> {
        const OP: &str = "get_user_id_by_auth_token";

        let Some(id) = self
            .cache
            .get(&CacheKey::AuthToken(token))
            .await
            .map_err(cache_error(OP))?
        else {
            return Err(ServiceError::Unauthorized);
        };

        id.parse().map_err(|_| ServiceError::Cache {
            operation: OP,
            source: CacheError::InvalidData(format!("session holds '{id}' instead of a user id")),
        })
    }
}
