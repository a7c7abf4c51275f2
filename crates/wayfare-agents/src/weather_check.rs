//! Weather forecasting: geocode the destination, then forecast via
//! Open-Meteo, falling back to a web search summary when the forecast is
//! unavailable (e.g. the trip starts beyond Open-Meteo's 16-day window).
//! An OpenWeatherMap tier has no Rust provider counterpart in this crate
//! set — folded into the same web-search fallback tier, noted in
//! DESIGN.md.

use async_trait::async_trait;
use serde_json::json;
use wayfare_providers::geocode::GeocodeProvider;
use wayfare_providers::search::WebSearchProvider;
use wayfare_providers::weather::WeatherProvider;
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, PlannerState, PlannerStatePatch};

pub struct WeatherCheckNode {
    weather: WeatherProvider,
    web_search: WebSearchProvider,
    geocode: GeocodeProvider,
}

impl WeatherCheckNode {
    pub fn new(weather: WeatherProvider, web_search: WebSearchProvider, geocode: GeocodeProvider) -> Self {
        Self { weather, web_search, geocode }
    }
}

#[async_trait]
impl GraphNode for WeatherCheckNode {
    fn name(&self) -> &str {
        "weather_check"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let Some(request) = &state.trip_request else {
            return Ok(skip("No trip request available."));
        };
        let Some(destination) = request.destination.clone() else {
            return Ok(skip("Destination not yet resolved."));
        };

        let mut reasoning = Vec::new();
        let forecast_days = request.duration_days().clamp(1, 16);

        let Some(coords) = self.geocode.geocode(&destination).await else {
            reasoning.push(format!("Could not geocode {destination} for weather lookup."));
            return Ok(self.fallback_via_search(&destination, reasoning).await);
        };

        let (forecast, reason) = self.weather.forecast(coords.lat, coords.lng, forecast_days).await;
        if let Some(r) = reason {
            reasoning.push(format!("Open-Meteo: {r}"));
        }

        let (weather, summary) = match forecast {
            Some(value) => {
                let summary = format!("{forecast_days}-day forecast retrieved for {destination}.");
                (Some(value), summary)
            }
            None => {
                reasoning.push("Falling back to web search for a weather summary.".to_string());
                let query = format!("weather forecast {destination} India next few days");
                let (outcome, reason) = self.web_search.search(&query).await;
                if let Some(r) = reason {
                    reasoning.push(format!("Web search: {r}"));
                    (None, "Weather unavailable.".to_string())
                } else {
                    let answer = outcome.and_then(|o| o.answer).unwrap_or_else(|| "No summary available.".to_string());
                    let value = json!({ "summary": answer, "source": "tavily_web" });
                    (Some(value), format!("Web-search weather summary for {destination}."))
                }
            }
        };

        let decision = AgentDecision::new("weather_check", "check_weather", reasoning.join(" "), summary);
        let patch = PlannerStatePatch {
            weather,
            current_stage: Some("weather_check_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "search_aggregator"))
    }
}

impl WeatherCheckNode {
    async fn fallback_via_search(&self, destination: &str, mut reasoning: Vec<String>) -> NodeOutcome {
        let query = format!("weather forecast {destination} India next few days");
        let (outcome, reason) = self.web_search.search(&query).await;
        let (weather, summary) = if let Some(r) = reason {
            reasoning.push(format!("Web search: {r}"));
            (None, "Weather unavailable.".to_string())
        } else {
            let answer = outcome.and_then(|o| o.answer).unwrap_or_else(|| "No summary available.".to_string());
            (Some(json!({ "summary": answer, "source": "tavily_web" })), format!("Web-search weather summary for {destination}."))
        };

        let decision = AgentDecision::new("weather_check", "check_weather", reasoning.join(" "), summary);
        let patch = PlannerStatePatch {
            weather,
            current_stage: Some("weather_check_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        NodeOutcome::next(patch, "search_aggregator")
    }
}

fn skip(reason: &str) -> NodeOutcome {
    let decision = AgentDecision::new("weather_check", "skip", reason.to_string(), "Skipped".to_string());
    let patch = PlannerStatePatch {
        current_stage: Some("weather_check_done".to_string()),
        agent_decisions: Some(vec![decision]),
        ..Default::default()
    };
    NodeOutcome::next(patch, "search_aggregator")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wayfare_cache::CacheClient;

    #[tokio::test]
    async fn missing_destination_skips_cleanly() {
        let cache = Arc::new(CacheClient::in_memory());
        let node = WeatherCheckNode::new(WeatherProvider::new(cache.clone()), WebSearchProvider::new(None, cache.clone()), GeocodeProvider::new(cache));
        let mut state = PlannerState::new("s", "u", "plan a trip");
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Delhi".to_string()),
            destination: None,
            start_date: None,
            end_date: None,
            budget: None,
            num_travelers: 1,
            travel_style: None,
            interests: vec![],
        });

        let outcome = node.run(&state).await.unwrap();
        assert!(outcome.patch.weather.is_none());
    }
}
