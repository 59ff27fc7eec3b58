use async_trait::async_trait;
use griz_core::repository::Result;
use griz_core::{
    Code, CodeId, CodeRepository, Credentials, NewCode, NewUser, StorageError, User, UserId,
    UserRepository,
};
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::{debug, warn};

const CODE_COLUMNS: &str = "id, user_id, source_url, hash, created_at, updated_at";

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn parse_timestamp(column: &str, seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{seconds}': {e}"))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn code_from_row(row: &MySqlRow) -> Result<Code> {
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: i64 = row.try_get("updated_at").map_err(map_sqlx_error)?;

    Ok(Code {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        user_id: row.try_get("user_id").map_err(map_sqlx_error)?,
        source_url: row.try_get("source_url").map_err(map_sqlx_error)?,
        hash: row.try_get("hash").map_err(map_sqlx_error)?,
        created_at: parse_timestamp("created_at", created_at)?,
        updated_at: parse_timestamp("updated_at", updated_at)?,
    })
}

/// MySQL-backed [`CodeRepository`] over the `codes` table.
///
/// Ids come from `AUTO_INCREMENT`; timestamps are stored as unix seconds.
#[derive(Debug, Clone)]
pub struct MySqlCodeRepository {
    pool: MySqlPool,
}

impl MySqlCodeRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn exists(&self, id: CodeId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM codes WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl CodeRepository for MySqlCodeRepository {
    async fn create(&self, code: NewCode) -> Result<CodeId> {
        let now = now_unix_seconds();

        let result = sqlx::query(
            r#"
            INSERT INTO codes (user_id, source_url, hash, created_at, updated_at)
            VALUES (?, ?, NULL, ?, ?)
            "#,
        )
        .bind(code.user_id)
        .bind(code.source_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let id = result.last_insert_id();
        debug!(id, "Inserted code");
        Ok(id)
    }

    async fn get(&self, id: CodeId) -> Result<Code> {
        let row = sqlx::query(&format!("SELECT {CODE_COLUMNS} FROM codes WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| StorageError::CodeNotFound(format!("id {id}")))?;

        code_from_row(&row)
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Code> {
        let row = sqlx::query(&format!(
            "SELECT {CODE_COLUMNS} FROM codes WHERE hash = ? LIMIT 1"
        ))
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| StorageError::CodeNotFound(format!("hash {hash}")))?;

        code_from_row(&row)
    }

    async fn update(&self, code: &Code) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE codes
            SET source_url = ?, hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&code.source_url)
        .bind(code.hash.as_deref())
        .bind(now_unix_seconds())
        .bind(code.id)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(err) if is_unique_violation(&err) => {
                warn!(id = code.id, "Hash already assigned to another code");
                return Err(StorageError::Conflict(format!(
                    "hash {} is taken",
                    code.hash.as_deref().unwrap_or_default()
                )));
            }
            Err(err) => return Err(map_sqlx_error(err)),
        };

        // MySQL counts changed rows only, so an identical write reports zero
        if result.rows_affected() == 0 && !self.exists(code.id).await? {
            return Err(StorageError::CodeNotFound(format!("id {}", code.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: CodeId) -> Result<()> {
        let result = sqlx::query("DELETE FROM codes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::CodeNotFound(format!("id {id}")));
        }
        Ok(())
    }

    async fn list_all(&self, user_id: UserId) -> Result<Vec<Code>> {
        let rows = sqlx::query(&format!(
            "SELECT {CODE_COLUMNS} FROM codes WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(code_from_row).collect()
    }

    async fn list(&self, user_id: UserId, offset: u64, limit: u64) -> Result<Vec<Code>> {
        let rows = sqlx::query(&format!(
            "SELECT {CODE_COLUMNS} FROM codes WHERE user_id = ? ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(code_from_row).collect()
    }
}

/// MySQL-backed [`UserRepository`] over the `users` table.
#[derive(Debug, Clone)]
pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn create(&self, user: NewUser) -> Result<UserId> {
        let result = sqlx::query("INSERT INTO users (username, password, email) VALUES (?, ?, ?)")
            .bind(&user.username)
            .bind(&user.password)
            .bind(&user.email)
            .execute(&self.pool)
            .await;

        match result {
            Ok(result) => Ok(result.last_insert_id()),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(format!(
                "username '{}' is taken",
                user.username
            ))),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn get(&self, id: UserId) -> Result<User> {
        let row = sqlx::query("SELECT id, username, password, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| StorageError::UserNotFound(format!("id {id}")))?;

        Ok(User {
            id: row.try_get("id").map_err(map_sqlx_error)?,
            username: row.try_get("username").map_err(map_sqlx_error)?,
            password: row.try_get("password").map_err(map_sqlx_error)?,
            email: row.try_get("email").map_err(map_sqlx_error)?,
        })
    }

    async fn get_by_username_and_pass(&self, credentials: &Credentials) -> Result<UserId> {
        let not_found = || StorageError::UserNotFound(credentials.username.clone());

        let row = sqlx::query("SELECT id, password FROM users WHERE username = ?")
            .bind(&credentials.username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(not_found)?;

        let password: String = row.try_get("password").map_err(map_sqlx_error)?;
        if password != credentials.password {
            return Err(not_found());
        }
        row.try_get("id").map_err(map_sqlx_error)
    }
}
