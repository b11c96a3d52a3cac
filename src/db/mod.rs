use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, ExecResult,
    QueryResult, Statement,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub mod migrator;

/// Minimal query capability the service layer is written against.
///
/// Statements carry their values out-of-band; nothing is interpolated into
/// the SQL text. Each call is an independent statement with no transaction
/// and no retry.
#[async_trait]
pub trait Queryer: Send + Sync {
    /// Dialect used to render statements for this connection.
    fn backend(&self) -> DbBackend;

    async fn query_rows(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr>;

    /// `Ok(None)` is the "no rows" outcome, distinct from a failure.
    async fn query_one_row(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr>;

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr>;
}

#[async_trait]
impl Queryer for DatabaseConnection {
    fn backend(&self) -> DbBackend {
        self.get_database_backend()
    }

    async fn query_rows(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        self.query_all(stmt).await
    }

    async fn query_one_row(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        self.query_one(stmt).await
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        ConnectionTrait::execute(self, stmt).await
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: Arc<DatabaseConnection>,
}

impl Store {
    /// Wraps an existing connection without running migrations.
    #[must_use]
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self {
            conn: Arc::new(conn),
        }
    }

    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if db_url.starts_with("sqlite:") && !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite:")
                .trim_start_matches("//")
                .split('?')
                .next()
                .unwrap_or_default();
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file: {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self::from_connection(conn))
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Queryer for Store {
    fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }

    async fn query_rows(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        self.conn.query_rows(stmt).await
    }

    async fn query_one_row(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        self.conn.query_one_row(stmt).await
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        Queryer::execute(self.conn.as_ref(), stmt).await
    }
}
