use std::time::Duration;

use moka::future::Cache;

/// Observability snapshot for the retriever cache (§4.8 supplemented ops).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieverCacheStats {
    pub entry_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticCacheStats {
    pub entry_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchValidationCacheStats {
    pub entry_count: u64,
}

/// The three TTL caches fronting the pipeline's expensive calls (§5, §9):
/// semantic relevance, batch validation, and the retriever's composite
/// result. Bundled into one handle so a single `invalidate_all()` can fan
/// out to every cache when the signal corpus is mutated upstream.
pub struct Caches {
    semantic: Cache<String, String>,
    batch_validation: Cache<String, String>,
    retriever: Cache<String, String>,
}

impl Caches {
    pub fn new(
        semantic_ttl: Duration,
        batch_validation_ttl: Duration,
        retriever_ttl: Duration,
        max_capacity: u64,
    ) -> Self {
        let build = |ttl: Duration| {
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build()
        };
        Self {
            semantic: build(semantic_ttl),
            batch_validation: build(batch_validation_ttl),
            retriever: build(retriever_ttl),
        }
    }

    pub async fn get_semantic(&self, key: &str) -> Option<String> {
        self.semantic.get(key).await
    }

    pub async fn insert_semantic(&self, key: String, value: String) {
        self.semantic.insert(key, value).await;
    }

    pub async fn get_batch_validation(&self, key: &str) -> Option<String> {
        self.batch_validation.get(key).await
    }

    pub async fn insert_batch_validation(&self, key: String, value: String) {
        self.batch_validation.insert(key, value).await;
    }

    pub async fn get_retriever(&self, key: &str) -> Option<String> {
        self.retriever.get(key).await
    }

    pub async fn insert_retriever(&self, key: String, value: String) {
        self.retriever.insert(key, value).await;
    }

    /// Clears only the retriever cache, per §4.8's supplemented
    /// `invalidate_cache()` operation.
    pub async fn invalidate_retriever(&self) {
        self.retriever.invalidate_all();
        self.retriever.run_pending_tasks().await;
    }

    /// Invalidates all three caches; triggered when the signal corpus is
    /// mutated by the ingestion collaborator (§5).
    pub async fn invalidate_all(&self) {
        self.semantic.invalidate_all();
        self.batch_validation.invalidate_all();
        self.retriever.invalidate_all();
        self.semantic.run_pending_tasks().await;
        self.batch_validation.run_pending_tasks().await;
        self.retriever.run_pending_tasks().await;
    }

    pub fn retriever_stats(&self) -> RetrieverCacheStats {
        RetrieverCacheStats {
            entry_count: self.retriever.entry_count(),
        }
    }

    pub fn semantic_stats(&self) -> SemanticCacheStats {
        SemanticCacheStats {
            entry_count: self.semantic.entry_count(),
        }
    }

    pub fn batch_validation_stats(&self) -> BatchValidationCacheStats {
        BatchValidationCacheStats {
            entry_count: self.batch_validation.entry_count(),
        }
    }
}
