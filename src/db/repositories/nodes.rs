use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::Utc;
use log::warn;
use rusqlite::params;
use serde_json::Value;

use crate::db::{
    helpers::{json_field_path, parse_value_json},
    Database,
};

impl Database {
    pub async fn insert_child(&self, path: &str, child_key: &str, value: &Value) -> Result<()> {
        let path = path.to_string();
        let child_key = child_key.to_string();
        let value_json = serde_json::to_string(value).context("failed to serialize child value")?;
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO nodes (path, child_key, value_json, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![path, child_key, value_json, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("failed to insert child {child_key} under {path}"))?;
            Ok(())
        })
        .await
    }

    /// Children of `path` whose string field `order_key` is within
    /// `[start, end]`, keyed by child key. Children whose stored text is not
    /// JSON are skipped with a warning.
    pub async fn get_children_in_range(
        &self,
        path: &str,
        order_key: &str,
        start: &str,
        end: &str,
    ) -> Result<BTreeMap<String, Value>> {
        let path = path.to_string();
        let field = json_field_path(order_key);
        let start = start.to_string();
        let end = end.to_string();
        self.execute(move |conn| {
            // CASE keeps json_type/json_extract away from malformed rows.
            let mut stmt = conn.prepare(
                "WITH children AS (
                     SELECT child_key, value_json, json_valid(value_json) AS valid
                     FROM nodes
                     WHERE path = ?1
                 )
                 SELECT child_key, value_json
                 FROM children
                 WHERE valid = 0
                    OR (CASE WHEN valid THEN json_type(value_json, ?2) END = 'text'
                        AND CASE WHEN valid THEN json_extract(value_json, ?2) END
                            BETWEEN ?3 AND ?4)
                 ORDER BY child_key ASC",
            )?;

            let mut rows = stmt.query(params![path, field, start, end])?;
            let mut children = BTreeMap::new();
            while let Some(row) = rows.next()? {
                let child_key: String = row.get(0)?;
                let value_json: String = row.get(1)?;
                match parse_value_json(&value_json, &path, &child_key) {
                    Ok(value) => {
                        children.insert(child_key, value);
                    }
                    Err(err) => warn!("skipping stored child: {err:#}"),
                }
            }

            Ok(children)
        })
        .await
    }

    pub async fn count_children(&self, path: &str) -> Result<usize> {
        let path = path.to_string();
        self.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM nodes WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }
}
