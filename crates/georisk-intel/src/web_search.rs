use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use georisk_models::asset_profile::AssetProfile;
use georisk_models::signal::{RawSignal, SignalSource};
use georisk_models::theme::ThemeRelevance;

use crate::error::IntelError;
use crate::llm::LlmClient;

/// 21-domain trusted allowlist for the research back-end (§4.7).
pub const TRUSTED_DOMAINS: &[&str] = &[
    "reuters.com",
    "apnews.com",
    "bbc.com",
    "bloomberg.com",
    "ft.com",
    "wsj.com",
    "cnbc.com",
    "aljazeera.com",
    "dw.com",
    "theguardian.com",
    "economist.com",
    "forbes.com",
    "axios.com",
    "politico.com",
    "imf.org",
    "worldbank.org",
    "state.gov",
    "ec.europa.eu",
    "un.org",
    "nato.int",
    "oecd.org",
];

/// Substrings of URLs to drop regardless of back-end (§4.7).
pub const LOW_QUALITY_URL_PATTERNS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "reddit.com",
    "quora.com",
    "pinterest.com",
    "tiktok.com",
    "medium.com/@",
    "blogspot.com",
    "wordpress.com",
    "wikipedia.org",
    "prnewswire.com",
    "businesswire.com",
    "globenewswire.com",
];

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "in", "on", "at", "to", "for", "and", "or", "is", "are", "was", "were",
];

const JACCARD_DEDUP_THRESHOLD: f64 = 0.7;
const MIN_TITLE_LEN: usize = 20;
const MIN_SNIPPET_LEN: usize = 50;
const SNIPPET_MAX_LEN: usize = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub published_date: Option<String>,
}

/// One back-end HTTP search provider (§6: Provider A "research" or
/// Provider B "general").
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        trusted_domains: Option<&[&str]>,
    ) -> Result<Vec<SearchResult>, IntelError>;
}

#[derive(Serialize)]
struct ResearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    include_domains: &'a [&'a str],
}

#[derive(Deserialize)]
struct ResearchResultItem {
    title: String,
    url: String,
    content: String,
    #[serde(default)]
    published_date: Option<String>,
}

#[derive(Deserialize)]
struct ResearchResponse {
    results: Vec<ResearchResultItem>,
}

/// Research-oriented back-end (Provider A, Tavily-shaped): restricted to
/// `include_domains`, `search_depth: "advanced"`.
pub struct ResearchSearchProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ResearchSearchProvider {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl WebSearchProvider for ResearchSearchProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        trusted_domains: Option<&[&str]>,
    ) -> Result<Vec<SearchResult>, IntelError> {
        let domains = trusted_domains.unwrap_or(TRUSTED_DOMAINS);
        let request = ResearchRequest {
            api_key: &self.api_key,
            query,
            search_depth: "advanced",
            max_results,
            include_domains: domains,
        };

        let response = self
            .http
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|source| IntelError::Http {
                provider: "research_search",
                source,
            })?;

        let parsed: ResearchResponse = response.json().await.map_err(|source| IntelError::Http {
            provider: "research_search",
            source,
        })?;

        Ok(parsed
            .results
            .into_iter()
            .map(|item| SearchResult {
                title: item.title,
                url: item.url,
                snippet: item.content,
                published_date: item.published_date,
            })
            .collect())
    }
}

#[derive(Serialize)]
struct GeneralRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize)]
struct GeneralResultItem {
    title: String,
    link: String,
    snippet: String,
}

#[derive(Deserialize)]
struct GeneralResponse {
    #[serde(default)]
    organic: Vec<GeneralResultItem>,
}

/// General-purpose back-end (Provider B, Serper-shaped): no domain
/// restriction, caller post-filters.
pub struct GeneralSearchProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeneralSearchProvider {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl WebSearchProvider for GeneralSearchProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        _trusted_domains: Option<&[&str]>,
    ) -> Result<Vec<SearchResult>, IntelError> {
        let request = GeneralRequest {
            q: query,
            num: max_results,
        };

        let response = self
            .http
            .post(&self.base_url)
            .header("X-API-KEY", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| IntelError::Http {
                provider: "general_search",
                source,
            })?;

        let parsed: GeneralResponse = response.json().await.map_err(|source| IntelError::Http {
            provider: "general_search",
            source,
        })?;

        Ok(parsed
            .organic
            .into_iter()
            .map(|item| SearchResult {
                title: item.title,
                url: item.link,
                snippet: item.snippet,
                published_date: None,
            })
            .collect())
    }
}

fn is_low_quality_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    LOW_QUALITY_URL_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

fn tokenize(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Drops near-duplicate titles (Jaccard ≥ 0.7 on stopword-stripped word
/// sets), keeping the first occurrence in iteration order.
fn dedup_by_title(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut kept: Vec<SearchResult> = Vec::new();
    let mut kept_tokens: Vec<HashSet<String>> = Vec::new();

    for result in results {
        let tokens = tokenize(&result.title);
        let is_duplicate = kept_tokens
            .iter()
            .any(|existing| jaccard_similarity(existing, &tokens) >= JACCARD_DEDUP_THRESHOLD);
        if !is_duplicate {
            kept_tokens.push(tokens);
            kept.push(result);
        }
    }
    kept
}

fn truncate_snippet(snippet: &str) -> String {
    if snippet.chars().count() <= SNIPPET_MAX_LEN {
        snippet.to_string()
    } else {
        snippet.chars().take(SNIPPET_MAX_LEN).collect()
    }
}

fn post_filter(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let filtered: Vec<SearchResult> = results
        .into_iter()
        .filter(|r| r.title.chars().count() >= MIN_TITLE_LEN && r.snippet.chars().count() >= MIN_SNIPPET_LEN)
        .filter(|r| !is_low_quality_url(&r.url))
        .map(|mut r| {
            r.snippet = truncate_snippet(&r.snippet);
            r
        })
        .collect();
    dedup_by_title(filtered)
}

/// Deterministic fallback query: country-or-region, lowercased theme
/// name, a financial-context token, and a year token (only for short
/// lookback windows). The year comes from the current UTC date at call
/// time, never a hardcoded literal (§4.7, §9).
fn fallback_query(profile: &AssetProfile, theme: &ThemeRelevance, lookback_days: u32) -> String {
    let location = profile.country.clone().unwrap_or_else(|| profile.region.clone());
    let mut parts = vec![location, theme.theme.replace('_', " "), "financial impact".to_string()];
    if lookback_days <= 30 {
        parts.push(Utc::now().format("%Y").to_string());
    }
    parts.join(" ")
}

const REFINEMENT_INSTRUCTION_WORDS: &[&str] = &["query:", "here", "search", "sure", "certainly"];

fn clean_refined_query(raw: &str) -> Option<String> {
    let mut candidate = raw.trim().to_string();
    for prefix in ["query:", "Query:", "here is a query:", "here's a query:"] {
        if let Some(stripped) = candidate.strip_prefix(prefix) {
            candidate = stripped.trim().to_string();
        }
    }
    candidate = candidate.trim_matches('"').to_string();

    let word_count = candidate.split_whitespace().count();
    if !(3..=10).contains(&word_count) {
        return None;
    }
    let lower = candidate.to_lowercase();
    if REFINEMENT_INSTRUCTION_WORDS
        .iter()
        .any(|word| lower.starts_with(word))
    {
        return None;
    }
    Some(candidate)
}

/// Builds the search query: tries LLM refinement under a 5-second
/// timeout, falls back to the deterministic template on any failure or
/// rejected shape (§4.7).
pub async fn build_query(
    profile: &AssetProfile,
    theme: &ThemeRelevance,
    lookback_days: u32,
    llm: Option<&dyn LlmClient>,
) -> String {
    if let Some(llm) = llm {
        let system_prompt = "Produce a concise financial news search query, 3 to 10 words, no preamble.";
        let user_prompt = format!(
            "Country or region: {}. Theme: {}. Respond with only the query text.",
            profile.country.as_deref().unwrap_or(&profile.region),
            theme.theme
        );
        let refined = tokio::time::timeout(
            Duration::from_secs(5),
            llm.complete_with_cascade(system_prompt, &user_prompt),
        )
        .await;

        if let Ok(Some(text)) = refined {
            if let Some(cleaned) = clean_refined_query(&text) {
                return cleaned;
            }
        }
    }
    fallback_query(profile, theme, lookback_days)
}

fn url_is_trusted(url: &str) -> bool {
    let lower = url.to_lowercase();
    TRUSTED_DOMAINS.iter().any(|domain| lower.contains(domain))
}

/// §4.7: full theme search for an already-built query — calls the
/// provider, post filters, and converts surviving results into
/// `RawSignal`s tagged with a trust bonus for allowlisted domains.
pub async fn search_theme(
    profile: &AssetProfile,
    theme: &ThemeRelevance,
    query: &str,
    max_results: usize,
    provider: &dyn WebSearchProvider,
) -> Result<Vec<RawSignal>, IntelError> {
    let raw_results = provider.search(query, max_results, Some(TRUSTED_DOMAINS)).await?;
    let filtered = post_filter(raw_results);

    Ok(filtered
        .into_iter()
        .map(|result| RawSignal {
            source: SignalSource::Web,
            title: result.title,
            summary: result.snippet,
            topic: theme.theme.clone(),
            url: Some(result.url),
            country: profile.country.clone(),
            published_at: result.published_date.unwrap_or_default(),
            activity_level: None,
        })
        .collect())
}

pub fn trust_bonus(url: &str) -> f64 {
    if url_is_trusted(url) {
        0.1
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, url: &str, snippet: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
            published_date: None,
        }
    }

    #[test]
    fn low_quality_urls_are_flagged() {
        assert!(is_low_quality_url("https://www.facebook.com/post/1"));
        assert!(is_low_quality_url("https://en.wikipedia.org/wiki/Russia"));
        assert!(!is_low_quality_url("https://www.reuters.com/article/1"));
    }

    #[test]
    fn jaccard_dedup_drops_near_identical_titles() {
        let results = vec![
            result(
                "Russia sanctions expand against banking sector",
                "https://reuters.com/a",
                &"x".repeat(60),
            ),
            result(
                "Russia sanctions expand against the banking sector",
                "https://bloomberg.com/b",
                &"y".repeat(60),
            ),
            result(
                "Completely unrelated story about fishing quotas",
                "https://ft.com/c",
                &"z".repeat(60),
            ),
        ];
        let deduped = dedup_by_title(post_filter_without_dedup(results));
        assert_eq!(deduped.len(), 2);
    }

    fn post_filter_without_dedup(results: Vec<SearchResult>) -> Vec<SearchResult> {
        results
            .into_iter()
            .filter(|r| r.title.chars().count() >= MIN_TITLE_LEN && r.snippet.chars().count() >= MIN_SNIPPET_LEN)
            .filter(|r| !is_low_quality_url(&r.url))
            .collect()
    }

    #[test]
    fn snippet_is_truncated_to_300_chars() {
        let long_snippet = "a".repeat(400);
        let truncated = truncate_snippet(&long_snippet);
        assert_eq!(truncated.chars().count(), 300);
    }

    #[test]
    fn short_title_or_snippet_is_dropped() {
        let results = vec![result("Too short", "https://reuters.com/a", &"x".repeat(60))];
        assert!(post_filter(results).is_empty());
    }

    #[test]
    fn clean_refined_query_rejects_out_of_range_word_counts() {
        assert!(clean_refined_query("too short").is_none());
        assert!(clean_refined_query(&"word ".repeat(15)).is_none());
    }

    #[test]
    fn clean_refined_query_strips_prefix() {
        let cleaned = clean_refined_query("query: Russia sanctions banking sector impact").unwrap();
        assert!(!cleaned.to_lowercase().starts_with("query"));
    }

    #[test]
    fn trust_bonus_applies_only_to_allowlisted_domains() {
        assert_eq!(trust_bonus("https://www.reuters.com/article"), 0.1);
        assert_eq!(trust_bonus("https://www.randomblog.net/post"), 0.0);
    }
}
