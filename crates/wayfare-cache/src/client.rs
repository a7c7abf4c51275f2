//! Two-tier HTTP retry-cache client: Tier 1 is a process-local map, Tier 2
//! is a durable key-value store. Requests race neither tier: on a miss in
//! both, the HTTP call is made with retry/backoff, then both tiers are
//! written through. Concurrent callers may duplicate the HTTP call (at
//! least once, not exactly once) but never corrupt the cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::durable::{DurableCache, DurableRow};
use crate::key::{cache_key, cache_key_with_body};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Flights,
    Hotels,
    Weather,
    Places,
    Generic,
}

impl CacheNamespace {
    pub fn label(&self) -> &'static str {
        match self {
            CacheNamespace::Flights => "flights",
            CacheNamespace::Hotels => "hotels",
            CacheNamespace::Weather => "weather",
            CacheNamespace::Places => "places",
            CacheNamespace::Generic => "generic",
        }
    }

    /// Namespace-specific TTL: flights 30min, hotels 1h, weather 2h,
    /// places 24h.
    pub fn default_ttl(&self) -> Duration {
        match self {
            CacheNamespace::Flights => Duration::from_secs(30 * 60),
            CacheNamespace::Hotels => Duration::from_secs(60 * 60),
            CacheNamespace::Weather => Duration::from_secs(2 * 60 * 60),
            CacheNamespace::Places => Duration::from_secs(24 * 60 * 60),
            CacheNamespace::Generic => Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("request failed after {attempts} attempts: {detail}")]
    Exhausted { attempts: u32, detail: String },
    #[error("non-retryable HTTP status {0}")]
    Status(StatusCode),
    #[error("response body was not valid JSON: {0}")]
    Parse(String),
}

struct Tier1Entry {
    doc: Value,
    expires_at: DateTime<Utc>,
}

enum RequestShape<'a> {
    Get { url: &'a str, params: &'a [(String, String)] },
    Post { url: &'a str, body: &'a Value },
}

pub struct CacheClient {
    http: Client,
    tier1: Arc<RwLock<HashMap<String, Tier1Entry>>>,
    tier2: Arc<dyn DurableCache>,
    pub(crate) call_count: Arc<std::sync::atomic::AtomicU64>,
    ttl_overrides: HashMap<CacheNamespace, Duration>,
}

impl CacheClient {
    pub fn new(tier2: Arc<dyn DurableCache>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with static config");
        Self {
            http,
            tier1: Arc::new(RwLock::new(HashMap::new())),
            tier2,
            call_count: Arc::new(std::sync::atomic::AtomicU64::new(0)),
            ttl_overrides: HashMap::new(),
        }
    }

    /// A `CacheClient` backed by [`crate::durable::InMemoryDurableCache`]
    /// rather than a file — for tests and for provider construction that
    /// doesn't need durability across process restarts.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(crate::durable::InMemoryDurableCache::new()))
    }

    /// Per-namespace TTL overrides (e.g. from `WAYFARE_TTL_FLIGHTS_SECS`),
    /// applied in place of `CacheNamespace::default_ttl` where present.
    pub fn with_ttl_overrides(mut self, overrides: HashMap<CacheNamespace, Duration>) -> Self {
        self.ttl_overrides = overrides;
        self
    }

    fn ttl_for(&self, namespace: CacheNamespace) -> Duration {
        self.ttl_overrides.get(&namespace).copied().unwrap_or_else(|| namespace.default_ttl())
    }

    pub fn calls_made(&self) -> u64 {
        self.call_count.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub async fn get(
        &self,
        namespace: CacheNamespace,
        url: &str,
        params: &[(String, String)],
        headers: &[(String, String)],
    ) -> Result<Value, HttpError> {
        let key = cache_key(namespace.label(), url, params);
        self.get_or_fetch(namespace, &key, RequestShape::Get { url, params }, headers).await
    }

    /// Same two-tier cache + retry flow as [`CacheClient::get`], for
    /// upstream calls that carry a JSON body (Google Places text search,
    /// Tavily search, LLM chat completions) rather than query params.
    pub async fn post(
        &self,
        namespace: CacheNamespace,
        url: &str,
        body: &Value,
        headers: &[(String, String)],
    ) -> Result<Value, HttpError> {
        let key = cache_key_with_body(namespace.label(), url, body);
        self.get_or_fetch(namespace, &key, RequestShape::Post { url, body }, headers).await
    }

    async fn get_or_fetch(
        &self,
        namespace: CacheNamespace,
        key: &str,
        shape: RequestShape<'_>,
        headers: &[(String, String)],
    ) -> Result<Value, HttpError> {
        if let Some(doc) = self.read_tier1(key).await {
            debug!(cache = "tier1-hit", key = %key);
            return Ok(doc);
        }

        if let Ok(Some(row)) = self.tier2.get(key).await {
            if row.expires_at > Utc::now() {
                debug!(cache = "tier2-hit", key = %key);
                self.write_tier1(key, row.response_json.clone(), row.expires_at).await;
                return Ok(row.response_json);
            }
        }

        let doc = self.fetch_with_retry(shape, headers).await?;
        let expires_at = Utc::now() + chrono::Duration::from_std(self.ttl_for(namespace)).unwrap();
        self.write_tier1(key, doc.clone(), expires_at).await;
        let _ = self
            .tier2
            .put(
                key,
                DurableRow {
                    response_json: doc.clone(),
                    created_at: Utc::now(),
                    expires_at,
                },
            )
            .await;
        Ok(doc)
    }

    async fn read_tier1(&self, key: &str) -> Option<Value> {
        {
            let guard = self.tier1.read().await;
            if let Some(entry) = guard.get(key) {
                if entry.expires_at > Utc::now() {
                    return Some(entry.doc.clone());
                }
            } else {
                return None;
            }
        }
        let mut guard = self.tier1.write().await;
        guard.remove(key);
        None
    }

    async fn write_tier1(&self, key: &str, doc: Value, expires_at: DateTime<Utc>) {
        let mut guard = self.tier1.write().await;
        guard.insert(key.to_string(), Tier1Entry { doc, expires_at });
    }

    /// Up to 3 attempts; retries only on connect/read timeout, 5xx, or
    /// 429. Backoff starts at 1s, doubles, caps at 4s.
    async fn fetch_with_retry(&self, shape: RequestShape<'_>, headers: &[(String, String)]) -> Result<Value, HttpError> {
        let mut backoff = Duration::from_secs(1);
        let mut last_err = String::new();

        for attempt in 1..=3u32 {
            self.call_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let mut req = match shape {
                RequestShape::Get { url, params } => self.http.get(url).query(params),
                RequestShape::Post { url, body } => self.http.post(url).json(body),
            };
            for (k, v) in headers {
                req = req.header(k, v);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .json::<Value>()
                            .await
                            .map_err(|e| HttpError::Parse(e.to_string()));
                    }
                    if is_retryable_status(status) {
                        last_err = format!("status {status}");
                        warn!(attempt, %status, "retryable http status");
                    } else {
                        return Err(HttpError::Status(status));
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_err = e.to_string();
                    warn!(attempt, error = %e, "retryable transport error");
                }
                Err(e) => {
                    return Err(HttpError::Exhausted {
                        attempts: attempt,
                        detail: e.to_string(),
                    });
                }
            }

            if attempt < 3 {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_secs(4));
            }
        }

        Err(HttpError::Exhausted {
            attempts: 3,
            detail: last_err,
        })
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durable::FileDurableCache;

    async fn client() -> CacheClient {
        let dir = std::env::temp_dir().join(format!("wayfare-cache-client-{}", uuid_like()));
        std::fs::create_dir_all(&dir).unwrap();
        let tier2 = FileDurableCache::new(dir.join("cache.json")).await.unwrap();
        CacheClient::new(Arc::new(tier2))
    }

    fn uuid_like() -> String {
        format!("{:?}-{}", std::time::SystemTime::now(), std::process::id())
    }

    #[tokio::test]
    async fn repeat_get_within_ttl_hits_tier1() {
        let client = client().await;
        // Seed tier1 directly to avoid real network calls in this unit test.
        let key = cache_key("flights", "https://example.invalid", &[]);
        client
            .write_tier1(&key, serde_json::json!({"hit": true}), Utc::now() + chrono::Duration::hours(1))
            .await;
        let doc = client.read_tier1(&key).await;
        assert!(doc.is_some());
    }

    #[test]
    fn retryable_statuses_are_5xx_and_429() {
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn repeat_get_through_the_real_entrypoint_hits_the_network_once() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client().await;
        let url = format!("{}/forecast", server.uri());

        let first = client.get(CacheNamespace::Generic, &url, &[], &[]).await.unwrap();
        let second = client.get(CacheNamespace::Generic, &url, &[], &[]).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.calls_made(), 1);
    }

    #[tokio::test]
    async fn a_failing_endpoint_is_retried_exactly_three_times_then_gives_up() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = client().await;
        let url = format!("{}/flaky", server.uri());

        let result = client.get(CacheNamespace::Generic, &url, &[], &[]).await;

        assert!(result.is_err());
        assert_eq!(client.calls_made(), 3);
    }

    #[tokio::test]
    async fn post_with_body_is_cache_keyed_on_the_body() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"places": []})))
            .expect(2)
            .mount(&server)
            .await;

        let client = client().await;
        let url = format!("{}/search", server.uri());

        client.post(CacheNamespace::Places, &url, &serde_json::json!({"q": "temples"}), &[]).await.unwrap();
        client.post(CacheNamespace::Places, &url, &serde_json::json!({"q": "temples"}), &[]).await.unwrap();
        client.post(CacheNamespace::Places, &url, &serde_json::json!({"q": "beaches"}), &[]).await.unwrap();

        assert_eq!(client.calls_made(), 2);
    }
}
