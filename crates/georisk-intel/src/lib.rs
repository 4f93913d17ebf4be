pub mod characterization;
pub mod error;
pub mod impact;
pub mod llm;
pub mod pipeline;
pub mod probability;
pub mod retriever;
pub mod scoring;
pub mod theme_mapper;
pub mod web_search;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use characterization::characterize;
pub use error::IntelError;
pub use impact::assess_impact;
pub use llm::{AnthropicClient, LlmClient};
pub use pipeline::{DetailedResult, Pipeline, ProgressUpdate, StepStatus};
pub use probability::synthesize_probabilities;
pub use retriever::{Retriever, ThemeSearchMetadata};
pub use theme_mapper::map_themes;
pub use web_search::{GeneralSearchProvider, ResearchSearchProvider, WebSearchProvider};
