//! Database access over sqlx. Rows come back as JSON objects keyed by
//! column name so the rest of the pipeline never touches driver types.

use crate::error::{AskdbError, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row, TypeInfo};
use std::time::Duration;
use tracing::{info, warn};

/// Runs SQL against the target database.
///
/// The agent holds this as its tool, and the orchestration re-runs extracted
/// SQL through the same capability for the structured result set.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn run(&self, sql: &str) -> Result<Vec<Value>>;
}

pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    pub async fn connect(db_uri: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(db_uri)
            .await
            .map_err(|e| AskdbError::Execution(format!("Failed to connect to database: {}", e)))?;

        // Test the connection
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| AskdbError::Execution(format!("Database ping failed: {}", e)))?;

        info!("Connected to MySQL");
        Ok(Self { pool })
    }
}

#[async_trait]
impl SqlExecutor for MySqlExecutor {
    async fn run(&self, sql: &str) -> Result<Vec<Value>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AskdbError::Execution(e.to_string()))?;

        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &MySqlRow) -> Value {
    let mut record = serde_json::Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        record.insert(column.name().to_string(), decode_column(row, idx));
    }
    Value::Object(record)
}

/// Probes the column with progressively looser types. SQL NULL decodes to
/// `None` at whichever probe matches the column type first.
fn decode_column(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return v
            .map(|dt| Value::from(dt.to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return v
            .map(|d| Value::from(d.to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
        return v
            .map(|t| Value::from(t.to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or(Value::Null);
    }

    let column = &row.columns()[idx];
    warn!(
        "Column '{}' has unsupported type {}, returning null",
        column.name(),
        column.type_info().name()
    );
    Value::Null
}
