use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntelError {
    #[error("invalid holding: {0}")]
    InvalidHolding(String),

    #[error("HTTP error calling {provider}: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("LLM response parse error: {0}")]
    Parse(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("store error: {0}")]
    Store(#[from] georisk_store::StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
