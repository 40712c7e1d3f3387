//! Query string encoding
//!
//! GitLab expects list-valued filters declared as array attributes in the
//! `key[]=a&key[]=b` form; any other list is sent comma separated.

use serde_json::Value;

use crate::resource::Attrs;

/// Ordered query pairs, passed straight to reqwest
pub type Query = Vec<(String, String)>;

/// Encode `params` into query pairs. `null` values are dropped.
pub fn encode_query(params: &Attrs, array_keys: &[&str]) -> Query {
    let mut pairs = Query::new();

    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) if array_keys.contains(&key.as_str()) => {
                let array_key = format!("{key}[]");
                pairs.extend(
                    items
                        .iter()
                        .filter_map(scalar)
                        .map(|v| (array_key.clone(), v)),
                );
            }
            Value::Array(items) => {
                let joined = items.iter().filter_map(scalar).collect::<Vec<_>>().join(",");
                pairs.push((key.clone(), joined));
            }
            other => {
                if let Some(v) = scalar(other) {
                    pairs.push((key.clone(), v));
                }
            }
        }
    }

    pairs
}

/// Render a scalar JSON value the way GitLab reads it from a query string
pub fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) => None,
        // Nested objects have no query form
        Value::Object(_) => Some(value.to_string()),
    }
}
