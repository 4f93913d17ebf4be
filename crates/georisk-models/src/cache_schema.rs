use serde::Serialize;

/// The three caches kept in front of the pipeline's expensive calls (§9).
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    Retriever,
    Semantic,
    BatchValidation,
}

impl CacheCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::Retriever => "retriever",
            CacheCategory::Semantic => "semantic",
            CacheCategory::BatchValidation => "batch_validation",
        }
    }
}

/// Builds an MD5 cache key from a category prefix and a canonical JSON
/// encoding of the key payload, matching the hashing scheme the original
/// engine used for its semantic and batch-validation caches.
///
/// `payload` must serialize to a JSON object; keys are sorted by
/// `serde_json::to_value` before hashing so that field order in the
/// caller's struct never changes the resulting key.
pub fn cache_key<T: Serialize>(category: CacheCategory, payload: &T) -> String {
    let value = serde_json::to_value(payload).expect("cache key payload must serialize");
    let canonical = canonicalize(&value);
    let digest = md5::compute(canonical.as_bytes());
    format!("{}:{:x}", category.as_str(), digest)
}

/// Re-serializes a `serde_json::Value` with object keys sorted
/// lexicographically, recursively, so equal payloads always hash the same
/// way regardless of field declaration order.
fn canonicalize(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body = entries
                .iter()
                .map(|(k, v)| format!("{:?}:{}", k, canonicalize(v)))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{body}}}")
        }
        serde_json::Value::Array(items) => {
            let body = items.iter().map(canonicalize).collect::<Vec<_>>().join(",");
            format!("[{body}]")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Payload {
        a: u32,
        b: String,
    }

    #[derive(Serialize)]
    struct PayloadReordered {
        b: String,
        a: u32,
    }

    #[test]
    fn key_is_stable_regardless_of_field_order() {
        let k1 = cache_key(
            CacheCategory::Semantic,
            &Payload {
                a: 1,
                b: "x".to_string(),
            },
        );
        let k2 = cache_key(
            CacheCategory::Semantic,
            &PayloadReordered {
                b: "x".to_string(),
                a: 1,
            },
        );
        assert_eq!(k1, k2);
    }

    #[test]
    fn key_is_prefixed_with_category() {
        let key = cache_key(CacheCategory::Retriever, &Payload { a: 1, b: "x".to_string() });
        assert!(key.starts_with("retriever:"));
    }

    #[test]
    fn different_payloads_hash_differently() {
        let k1 = cache_key(CacheCategory::BatchValidation, &Payload { a: 1, b: "x".to_string() });
        let k2 = cache_key(CacheCategory::BatchValidation, &Payload { a: 2, b: "x".to_string() });
        assert_ne!(k1, k2);
    }
}
