//! Deterministic request fingerprinting.
//!
//! A fingerprint identifies a request by its semantic content — prompt,
//! model, generation parameters — independent of parameter insertion order.
//! Callers can precompute one for logging without performing a lookup.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{CacheError, Result};

/// Build a deterministic fingerprint for `(prompt, model, params)`.
///
/// SHA-256 over length-prefixed fields, so adjacent fields cannot collide by
/// shifting bytes between them (`model = "ab"` vs `model = "a"`,
/// `prompt = "b…"`). `params` is treated as an unordered mapping: keys are
/// sorted before hashing, so `{a:1, b:2}` and `{b:2, a:1}` produce the same
/// fingerprint. `model` and `prompt` are hashed verbatim, with no trimming.
///
/// Output is 64 lowercase hex chars (256 bits), stable across process
/// restarts. An empty or all-whitespace `model` is rejected with
/// [`CacheError::InvalidArgument`].
pub fn fingerprint(prompt: &str, model: &str, params: &Map<String, Value>) -> Result<String> {
    if model.trim().is_empty() {
        return Err(CacheError::InvalidArgument(
            "model identifier must not be empty".to_string(),
        ));
    }

    let mut hasher = Sha256::new();
    update_field(&mut hasher, model.as_bytes());
    update_field(&mut hasher, prompt.as_bytes());

    let mut pairs: Vec<(&String, &Value)> = params.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in pairs {
        update_field(&mut hasher, key.as_bytes());
        // Value's JSON rendering is deterministic for a given value, so
        // parameter values of any shape hash stably.
        update_field(&mut hasher, value.to_string().as_bytes());
    }

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(hex, "{:02x}", byte);
    }
    Ok(hex)
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let params = obj(json!({"temperature": 0.7, "max_tokens": 256}));
        let f1 = fingerprint("hello", "gpt-4o", &params).unwrap();
        let f2 = fingerprint("hello", "gpt-4o", &params).unwrap();
        assert_eq!(f1, f2);
    }

    #[test]
    fn test_fingerprint_param_order_insensitive() {
        let mut a = Map::new();
        a.insert("temperature".to_string(), json!(0.7));
        a.insert("top_p".to_string(), json!(0.9));
        let mut b = Map::new();
        b.insert("top_p".to_string(), json!(0.9));
        b.insert("temperature".to_string(), json!(0.7));
        assert_eq!(
            fingerprint("hello", "gpt-4o", &a).unwrap(),
            fingerprint("hello", "gpt-4o", &b).unwrap(),
        );
    }

    #[test]
    fn test_fingerprint_model_aware() {
        let params = Map::new();
        let f1 = fingerprint("hello", "gpt-4o", &params).unwrap();
        let f2 = fingerprint("hello", "claude-sonnet", &params).unwrap();
        assert_ne!(f1, f2);
    }

    #[test]
    fn test_fingerprint_prompt_aware() {
        let params = Map::new();
        let f1 = fingerprint("hello", "gpt-4o", &params).unwrap();
        let f2 = fingerprint("goodbye", "gpt-4o", &params).unwrap();
        assert_ne!(f1, f2);
    }

    #[test]
    fn test_fingerprint_params_aware() {
        let f1 = fingerprint("hello", "gpt-4o", &obj(json!({"temperature": 0.2}))).unwrap();
        let f2 = fingerprint("hello", "gpt-4o", &obj(json!({"temperature": 0.7}))).unwrap();
        assert_ne!(f1, f2);
    }

    #[test]
    fn test_fingerprint_no_field_boundary_collision() {
        let empty = Map::new();
        // Shifting bytes between model and prompt must change the digest.
        let f1 = fingerprint("bc", "a", &empty).unwrap();
        let f2 = fingerprint("c", "ab", &empty).unwrap();
        assert_ne!(f1, f2);
        // Same between a parameter key and its value.
        let f3 = fingerprint("p", "m", &obj(json!({"ab": "c"}))).unwrap();
        let f4 = fingerprint("p", "m", &obj(json!({"a": "bc"}))).unwrap();
        assert_ne!(f3, f4);
    }

    #[test]
    fn test_fingerprint_rejects_empty_model() {
        let params = Map::new();
        assert!(matches!(
            fingerprint("hello", "", &params),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(matches!(
            fingerprint("hello", "   ", &params),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fingerprint_shape() {
        let f = fingerprint("", "gpt-4o", &Map::new()).unwrap();
        assert_eq!(f.len(), 64);
        assert!(f.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_nested_param_values() {
        let params = obj(json!({"stop": ["\n\n", "###"], "logit_bias": {"50256": -100}}));
        let f1 = fingerprint("hello", "gpt-4o", &params).unwrap();
        let f2 = fingerprint("hello", "gpt-4o", &params).unwrap();
        assert_eq!(f1, f2);
    }
}
