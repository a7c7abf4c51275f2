//! Reddit: read-only subreddit/title search used by `local_intel` as a
//! "hidden gems" source. Kept as its own adapter (rather than folded
//! into the web-search fallback) since it has a distinct credential pair
//! and a distinct normalized shape.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use wayfare_cache::{CacheClient, CacheNamespace};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: SearchData,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: String,
    score: i64,
    #[serde(default)]
    url: Option<String>,
    subreddit: String,
}

#[derive(Clone)]
pub struct RedditProvider {
    http: Client,
    cache: Arc<CacheClient>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl RedditProvider {
    pub fn new(client_id: Option<String>, client_secret: Option<String>, cache: Arc<CacheClient>) -> Self {
        let http = Client::builder()
            .user_agent("wayfare-engine/0.1")
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with static config");
        Self {
            http,
            cache,
            client_id,
            client_secret,
        }
    }

    pub async fn search_hidden_gems(&self, destination: &str) -> (Vec<Value>, Option<String>) {
        let (Some(id), Some(secret)) = (self.client_id.as_ref(), self.client_secret.as_ref()) else {
            return (vec![], Some("REDDIT_CLIENT_ID/SECRET not configured".to_string()));
        };
        if id.trim().is_empty() || secret.trim().is_empty() {
            return (vec![], Some("REDDIT_CLIENT_ID/SECRET not configured".to_string()));
        }

        let Some(token) = self.fetch_token(id, secret).await else {
            return (vec![], Some("reddit token exchange failed".to_string()));
        };

        let query = format!("{destination} hidden gems");
        let params = vec![
            ("q".to_string(), query),
            ("limit".to_string(), "10".to_string()),
            ("sort".to_string(), "relevance".to_string()),
        ];
        let headers = vec![
            ("Authorization".to_string(), format!("Bearer {token}")),
            ("User-Agent".to_string(), "wayfare-engine/0.1".to_string()),
        ];

        let doc = match self
            .cache
            .get(CacheNamespace::Generic, "https://oauth.reddit.com/search", &params, &headers)
            .await
        {
            Ok(doc) => doc,
            Err(e) => return (vec![], Some(format!("reddit search request failed: {e}"))),
        };

        let parsed: SearchResponse = match serde_json::from_value(doc) {
            Ok(p) => p,
            Err(e) => return (vec![], Some(format!("reddit search parse error: {e}"))),
        };

        let gems = parsed
            .data
            .children
            .into_iter()
            .map(|c| {
                json!({
                    "title": c.data.title,
                    "score": c.data.score,
                    "url": c.data.url,
                    "subreddit": c.data.subreddit,
                    "source_origin": "api",
                })
            })
            .collect();

        (gems, None)
    }

    /// Credential exchange, not cached: same rationale as the flight
    /// provider's token endpoint.
    async fn fetch_token(&self, id: &str, secret: &str) -> Option<String> {
        let resp = self
            .http
            .post("https://www.reddit.com/api/v1/access_token")
            .basic_auth(id, Some(secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let parsed: TokenResponse = resp.json().await.ok()?;
        Some(parsed.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache() -> Arc<CacheClient> {
        Arc::new(CacheClient::in_memory())
    }

    #[tokio::test]
    async fn unconfigured_credentials_short_circuit_empty() {
        let provider = RedditProvider::new(None, None, test_cache());
        let (gems, reason) = provider.search_hidden_gems("Rishikesh").await;
        assert!(gems.is_empty());
        assert!(reason.is_some());
    }
}
