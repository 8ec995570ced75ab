use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::db::helpers::parse_value_json;

// Plain functions over the worker's connection: `set` and `subscribe` pair
// these with registry calls inside one worker task.

pub(crate) fn upsert_path_value(conn: &Connection, path: &str, value: &Value) -> Result<()> {
    let value_json = serde_json::to_string(value).context("failed to serialize path value")?;
    conn.execute(
        "INSERT INTO path_values (path, value_json, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(path) DO UPDATE SET
             value_json = excluded.value_json,
             updated_at = excluded.updated_at",
        params![path, value_json, Utc::now().to_rfc3339()],
    )
    .with_context(|| format!("failed to store value at {path}"))?;
    Ok(())
}

pub(crate) fn get_path_value(conn: &Connection, path: &str) -> Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM path_values WHERE path = ?1",
            params![path],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to read value at {path}"))?;

    raw.map(|json| parse_value_json(&json, path, "value"))
        .transpose()
}
