//! Engine configuration: provider credentials and LLM routing, layered
//! `env > defaults`. Env-only, since a stateless planning service has no
//! per-project/global/managed config tiers to merge.

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,

    pub amadeus_client_id: Option<String>,
    pub amadeus_client_secret: Option<String>,
    pub liteapi_key: Option<String>,
    pub google_places_key: Option<String>,
    pub google_directions_key: Option<String>,
    pub openweathermap_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,

    pub state_dir: String,
    pub ttl_flights_secs: Option<u64>,
    pub ttl_hotels_secs: Option<u64>,
    pub ttl_weather_secs: Option<u64>,
    pub ttl_places_secs: Option<u64>,
}

impl EngineConfig {
    /// Reads every credential from the environment. Missing keys are not
    /// errors — each provider adapter degrades to its next fallback tier
    /// (or an empty result with a reason) when unconfigured.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: std::env::var("WAYFARE_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            amadeus_client_id: non_empty_env("AMADEUS_CLIENT_ID"),
            amadeus_client_secret: non_empty_env("AMADEUS_CLIENT_SECRET"),
            liteapi_key: non_empty_env("LITEAPI_KEY"),
            google_places_key: non_empty_env("GOOGLE_PLACES_KEY"),
            google_directions_key: non_empty_env("GOOGLE_DIRECTIONS_KEY"),
            openweathermap_key: non_empty_env("OPENWEATHERMAP_KEY"),
            tavily_api_key: non_empty_env("TAVILY_API_KEY"),
            reddit_client_id: non_empty_env("REDDIT_CLIENT_ID"),
            reddit_client_secret: non_empty_env("REDDIT_CLIENT_SECRET"),
            state_dir: std::env::var("WAYFARE_STATE_DIR").unwrap_or_else(|_| ".wayfare".to_string()),
            ttl_flights_secs: non_empty_env("WAYFARE_TTL_FLIGHTS_SECS").and_then(|v| v.parse().ok()),
            ttl_hotels_secs: non_empty_env("WAYFARE_TTL_HOTELS_SECS").and_then(|v| v.parse().ok()),
            ttl_weather_secs: non_empty_env("WAYFARE_TTL_WEATHER_SECS").and_then(|v| v.parse().ok()),
            ttl_places_secs: non_empty_env("WAYFARE_TTL_PLACES_SECS").and_then(|v| v.parse().ok()),
        }
    }

    /// Namespace TTL overrides, ready to hand to `CacheClient::with_ttl_overrides`.
    pub fn ttl_overrides(&self) -> std::collections::HashMap<wayfare_cache::CacheNamespace, std::time::Duration> {
        use wayfare_cache::CacheNamespace;
        use std::time::Duration;
        let mut map = std::collections::HashMap::new();
        if let Some(s) = self.ttl_flights_secs {
            map.insert(CacheNamespace::Flights, Duration::from_secs(s));
        }
        if let Some(s) = self.ttl_hotels_secs {
            map.insert(CacheNamespace::Hotels, Duration::from_secs(s));
        }
        if let Some(s) = self.ttl_weather_secs {
            map.insert(CacheNamespace::Weather, Duration::from_secs(s));
        }
        if let Some(s) = self.ttl_places_secs {
            map.insert(CacheNamespace::Places, Duration::from_secs(s));
        }
        map
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env_are_all_unconfigured() {
        for key in [
            "OPENAI_API_KEY",
            "AMADEUS_CLIENT_ID",
            "AMADEUS_CLIENT_SECRET",
            "LITEAPI_KEY",
            "GOOGLE_PLACES_KEY",
            "TAVILY_API_KEY",
            "REDDIT_CLIENT_ID",
            "REDDIT_CLIENT_SECRET",
        ] {
            std::env::remove_var(key);
        }
        let cfg = EngineConfig::from_env();
        assert!(cfg.openai_api_key.is_none());
        assert!(cfg.amadeus_client_id.is_none());
        assert_eq!(cfg.openai_base_url, "https://api.openai.com/v1");
    }
}
