//! Query string construction for API accessors.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Query parameters for `/channels/{id}/messages`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessagesQuery {
    pub limit: Option<u32>,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Query parameters for `/channels/{id}/messages/search`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchQuery {
    pub content: Option<String>,
    pub author_id: Option<String>,
    pub mentions: Option<String>,
    /// Content filters such as `link`, `file`, `image`.
    pub has: Vec<String>,
    pub min_id: Option<String>,
    pub max_id: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub include_nsfw: Option<bool>,
}

/// Flatten a parameter struct into `key=value` pairs.
///
/// Scalars become one pair, arrays repeat the key once per element, and
/// `null` values are skipped. Nested objects are rejected.
pub fn build_query<T: Serialize>(params: &T) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(params)?;
    let Value::Object(map) = value else {
        return Err(Error::Api("Query parameters must serialize to an object".into()));
    };

    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(scalar) = scalar_to_string(&key, &item)? {
                        pairs.push((key.clone(), scalar));
                    }
                }
            }
            other => {
                if let Some(scalar) = scalar_to_string(&key, &other)? {
                    pairs.push((key, scalar));
                }
            }
        }
    }

    Ok(pairs)
}

fn scalar_to_string(key: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err(Error::Api(format!(
            "Query parameter '{}' must be a scalar or an array of scalars",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_messages_query_skips_unset() {
        let query = MessagesQuery {
            limit: Some(100),
            before: Some("123".into()),
            after: None,
        };
        let mut pairs = build_query(&query).unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("before".to_string(), "123".to_string()),
                ("limit".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_arrays_repeat_key() {
        let query = SearchQuery {
            has: vec!["image".into(), "link".into()],
            include_nsfw: Some(true),
            ..Default::default()
        };
        let pairs = build_query(&query).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("has".to_string(), "image".to_string()),
                ("has".to_string(), "link".to_string()),
                ("include_nsfw".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_objects_rejected() {
        assert!(build_query(&json!({"a": {"b": 1}})).is_err());
        assert!(build_query(&json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_nulls_inside_arrays_skipped() {
        let pairs = build_query(&json!({"ids": [1, null, 3]})).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("ids".to_string(), "1".to_string()),
                ("ids".to_string(), "3".to_string()),
            ]
        );
    }
}
