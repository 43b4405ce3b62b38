use super::database;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SQLError;

const MIN_CONNECTIONS: u32 = 1;
const MAX_CONNECTIONS: u32 = 5;

/// Handle to the aggregate store
///
/// Wraps a bounded connection pool that is shared by everything one service
/// instance processes.
#[derive(Clone)]
pub struct AggregateStore {
    pool: PgPool,
}

impl AggregateStore {
    /// Connects to the store and creates missing tables
    pub async fn new(database_url: &str) -> Result<Self, SQLError> {
        let pool = PgPoolOptions::new()
            .min_connections(MIN_CONNECTIONS)
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;

        database::setup_tables(&pool).await?;

        Ok(Self { pool })
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
