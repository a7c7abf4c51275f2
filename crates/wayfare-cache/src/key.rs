use serde_json::Value;
use sha2::{Digest, Sha256};

/// Cache key = SHA-256 over the canonical JSON of `[namespace, url,
/// sorted-params]`. Params are sorted by key before hashing so two
/// logically-identical requests hash identically regardless of
/// construction order.
pub fn cache_key(namespace: &str, url: &str, params: &[(String, String)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let param_values: Vec<Value> = sorted
        .into_iter()
        .map(|(k, v)| Value::Array(vec![Value::String(k), Value::String(v)]))
        .collect();
    let canonical = Value::Array(vec![
        Value::String(namespace.to_string()),
        Value::String(url.to_string()),
        Value::Array(param_values),
    ]);
    let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

/// Cache key for a POST-with-JSON-body request: SHA-256 over the
/// canonical JSON of `[namespace, url, body]`, with the body's object
/// keys sorted recursively so two JSON-equal bodies serialized in a
/// different field order hash identically.
pub fn cache_key_with_body(namespace: &str, url: &str, body: &Value) -> String {
    let canonical = Value::Array(vec![
        Value::String(namespace.to_string()),
        Value::String(url.to_string()),
        canonicalize(body),
    ]);
    let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.iter().map(|(k, v)| (k.clone(), canonicalize(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Array(entries.into_iter().map(|(k, v)| Value::Array(vec![Value::String(k), v])).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_params_different_order_same_key() {
        let a = cache_key("flights", "https://x", &[("b".into(), "2".into()), ("a".into(), "1".into())]);
        let b = cache_key("flights", "https://x", &[("a".into(), "1".into()), ("b".into(), "2".into())]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_namespace_different_key() {
        let a = cache_key("flights", "https://x", &[]);
        let b = cache_key("hotels", "https://x", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn body_key_ignores_field_order() {
        let a = cache_key_with_body("places", "https://x", &serde_json::json!({"b": 2, "a": 1}));
        let b = cache_key_with_body("places", "https://x", &serde_json::json!({"a": 1, "b": 2}));
        assert_eq!(a, b);
    }

    #[test]
    fn body_key_differs_on_different_body() {
        let a = cache_key_with_body("places", "https://x", &serde_json::json!({"q": "temples"}));
        let b = cache_key_with_body("places", "https://x", &serde_json::json!({"q": "beaches"}));
        assert_ne!(a, b);
    }
}
