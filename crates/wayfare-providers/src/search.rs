//! General web search fallback, Tavily-shaped: `{answer, results:[{title,
//! url, content}]}`. Used by several agent nodes as the second-tier
//! fallback after their primary API and before an LLM-generated guess.

use serde::Deserialize;
use std::sync::Arc;

use wayfare_cache::{CacheClient, CacheNamespace};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchOutcome {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Clone)]
pub struct WebSearchProvider {
    cache: Arc<CacheClient>,
    api_key: Option<String>,
}

impl WebSearchProvider {
    pub fn new(api_key: Option<String>, cache: Arc<CacheClient>) -> Self {
        Self { cache, api_key }
    }

    pub async fn search(&self, query: &str) -> (Option<SearchOutcome>, Option<String>) {
        let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) else {
            return (None, Some("TAVILY_API_KEY not configured".to_string()));
        };

        let body = serde_json::json!({ "api_key": key, "query": query, "include_answer": true });

        let doc = match self.cache.post(CacheNamespace::Generic, "https://api.tavily.com/search", &body, &[]).await {
            Ok(doc) => doc,
            Err(e) => return (None, Some(format!("web search request failed: {e}"))),
        };

        match serde_json::from_value::<SearchOutcome>(doc) {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => (None, Some(format!("web search parse error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache() -> Arc<CacheClient> {
        Arc::new(CacheClient::in_memory())
    }

    #[tokio::test]
    async fn unconfigured_key_short_circuits_empty() {
        let provider = WebSearchProvider::new(None, test_cache());
        let (outcome, reason) = provider.search("things to do in Rishikesh").await;
        assert!(outcome.is_none());
        assert!(reason.is_some());
    }
}
