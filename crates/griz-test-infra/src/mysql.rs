use crate::{Result, TestInfraError};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

/// Account and database the code store connects with.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "griz".to_string())]
    database: String,
    #[builder(default = "griz".to_string())]
    username: String,
    #[builder(default = "griz".to_string())]
    password: String,
    /// Attempts made by [`MySqlServer::pool`] while the server finishes booting.
    #[builder(default = 20)]
    connect_attempts: u32,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// MySQL 8.4 backing the `users` and `codes` tables of the code store.
///
/// The container logs "ready for connections" once for its init server and
/// again for the real one, so the first connect can still be refused.
/// [`MySqlServer::pool`] retries for that window.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", "8.4")
            .with_exposed_port(3306_u16.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        Ok(self.container.get_host().await?.to_string())
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(3306).await?)
    }

    /// Connection string the code store takes as its database URL.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.host().await?;
        let port = self.port().await?;
        Ok(format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    /// Connects once the server accepts clients and runs each `schema`
    /// statement in order, e.g. the `users` then `codes` DDL.
    pub async fn pool(&self, schema: &[&str]) -> Result<MySqlPool> {
        let url = self.database_url().await?;
        let pool = connect_with_retry(&url, self.config.connect_attempts).await?;

        for statement in schema {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(pool)
    }
}

async fn connect_with_retry(url: &str, attempts: u32) -> Result<MySqlPool> {
    let mut last_error = None;

    for _ in 0..attempts.max(1) {
        match MySqlPoolOptions::new().max_connections(5).connect(url).await {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                last_error = Some(e);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    Err(TestInfraError::Unavailable(format!(
        "mysql at {url} refused {attempts} connection attempts: {last_error:?}"
    )))
}
