//! JSON key-value store
//!
//! Holds the last played track and per-track resume positions.

use crate::error::Result;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;

pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<Value>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((raw,)) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Store `value` under `key`; `Value::Null` deletes the key
pub async fn set(pool: &SqlitePool, key: &str, value: &Value) -> Result<()> {
    if value.is_null() {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(pool)
            .await?;
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(serde_json::to_string(value)?)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}
