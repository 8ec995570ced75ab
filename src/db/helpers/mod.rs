use anyhow::{Context, Result};
use serde_json::Value;

pub fn parse_value_json(raw: &str, path: &str, key: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("corrupt JSON stored at {path}/{key}"))
}

/// JSON path expression selecting `field` for `json_extract`.
pub fn json_field_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', ""))
}
