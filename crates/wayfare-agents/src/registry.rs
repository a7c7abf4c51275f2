//! Wires every node into a [`GraphDefinition`] via
//! `wayfare_runtime::GraphBuilder`'s `add_node`/`add_edge` calls.
//!
//! Almost every node here encodes its own continuation directly in the
//! [`wayfare_runtime::Route`] it returns, which overrides any registered
//! edge — so this builder mostly just registers nodes. The two exceptions
//! are the dispatcher nodes: a `Route::Dispatch` carries no "next step"
//! of its own, so the scheduler falls back to the dispatching node's
//! registered edge once every fanned-out branch completes. Those two
//! edges (`search_dispatcher` -> `search_aggregator`,
//! `enrichment_dispatcher` -> `enrichment_aggregator`) are the only
//! `add_edge` calls this graph needs.

use std::path::Path;
use std::sync::Arc;

use wayfare_cache::{CacheClient, FileDurableCache};
use wayfare_providers::{FlightProvider, GeocodeProvider, HotelProvider, LlmClient, PlacesProvider, RedditProvider, WeatherProvider, WebSearchProvider};
use wayfare_runtime::{GraphBuilder, GraphDefinition};

use crate::activity_search::ActivitySearchNode;
use crate::approval_gate::ApprovalGateNode;
use crate::budget_optimizer::BudgetOptimizerNode;
use crate::config::EngineConfig;
use crate::destination_recommender::DestinationRecommenderNode;
use crate::dispatch::{EnrichmentAggregatorNode, EnrichmentDispatcherNode, SearchAggregatorNode, SearchDispatcherNode};
use crate::festival_check::FestivalCheckNode;
use crate::flight_search::FlightSearchNode;
use crate::hotel_search::HotelSearchNode;
use crate::intent_parser::{IntentParserNode, RouteAfterIntentNode};
use crate::itinerary_builder::ItineraryBuilderNode;
use crate::local_intel::LocalIntelNode;
use crate::qa::{ClarificationNode, ConversationHandlerNode, FeedbackHandlerNode};
use crate::response_validator::ResponseValidatorNode;
use crate::supervisor::SupervisorNode;
use crate::vibe_scorer::VibeScorerNode;
use crate::weather_check::WeatherCheckNode;

/// Builds the default planning graph from a loaded [`EngineConfig`],
/// constructing one provider client per node that needs it. Providers
/// are cheap to clone (an `Arc<CacheClient>` plus a handful of `String`
/// fields), so each node owns its own instance rather than sharing a
/// provider directly — but every instance shares the same underlying
/// [`CacheClient`], so the two-tier cache is genuinely shared across the
/// graph rather than duplicated per node.
pub async fn build_graph(config: &EngineConfig) -> anyhow::Result<GraphDefinition> {
    let cache_path = Path::new(&config.state_dir).join("api_cache.json");
    let durable = FileDurableCache::new(cache_path).await?;
    let cache = Arc::new(CacheClient::new(Arc::new(durable)).with_ttl_overrides(config.ttl_overrides()));

    let llm = || LlmClient::new(config.openai_api_key.clone(), config.openai_base_url.clone(), config.openai_model.clone(), cache.clone());
    let web_search = || WebSearchProvider::new(config.tavily_api_key.clone(), cache.clone());
    let geocode = || GeocodeProvider::new(cache.clone());

    GraphDefinition::builder("supervisor")
        .add_node(Arc::new(SupervisorNode::new(llm())))
        .add_node(Arc::new(IntentParserNode::new(llm())))
        .add_node(Arc::new(RouteAfterIntentNode::new()))
        .add_node(Arc::new(DestinationRecommenderNode::new(llm())))
        .add_node(Arc::new(ClarificationNode::new()))
        .add_node(Arc::new(ConversationHandlerNode::new(llm())))
        .add_node(Arc::new(FeedbackHandlerNode::new(llm())))
        .add_node(Arc::new(SearchDispatcherNode::new()))
        .add_node(Arc::new(FlightSearchNode::new(
            FlightProvider::new(config.amadeus_client_id.clone(), config.amadeus_client_secret.clone(), cache.clone()),
            web_search(),
            geocode(),
        )))
        .add_node(Arc::new(HotelSearchNode::new(HotelProvider::new(config.liteapi_key.clone(), cache.clone()), web_search())))
        .add_node(Arc::new(ActivitySearchNode::new(
            PlacesProvider::new(config.google_places_key.clone(), cache.clone()),
            web_search(),
            llm(),
            geocode(),
        )))
        .add_node(Arc::new(WeatherCheckNode::new(WeatherProvider::new(cache.clone()), web_search(), geocode())))
        .add_node(Arc::new(SearchAggregatorNode::new()))
        .add_node(Arc::new(EnrichmentDispatcherNode::new()))
        .add_node(Arc::new(LocalIntelNode::new(
            RedditProvider::new(config.reddit_client_id.clone(), config.reddit_client_secret.clone(), cache.clone()),
            llm(),
        )))
        .add_node(Arc::new(FestivalCheckNode::new(llm())))
        .add_node(Arc::new(EnrichmentAggregatorNode::new()))
        .add_node(Arc::new(ApprovalGateNode::new()))
        .add_node(Arc::new(BudgetOptimizerNode::new(llm())))
        .add_node(Arc::new(ItineraryBuilderNode::new(llm())))
        .add_node(Arc::new(ResponseValidatorNode::new()))
        .add_node(Arc::new(VibeScorerNode::new(llm())))
        .add_edge("search_dispatcher", "search_aggregator")
        .add_edge("enrichment_dispatcher", "enrichment_aggregator")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_graph_registers_every_node_builder_py_names() {
        let graph = build_graph(&test_config()).await.unwrap();
        let names = graph.node_names();
        for expected in [
            "supervisor",
            "intent_parser",
            "route_after_intent",
            "destination_recommender",
            "clarification",
            "conversation_handler",
            "feedback_handler",
            "search_dispatcher",
            "flight_search",
            "hotel_search",
            "activity_search",
            "weather_check",
            "search_aggregator",
            "enrichment_dispatcher",
            "local_intel",
            "festival_check",
            "enrichment_aggregator",
            "approval_gate",
            "budget_optimizer",
            "itinerary_builder",
            "response_validator",
            "vibe_scorer",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing node: {expected}");
        }
    }

    #[tokio::test]
    async fn dispatch_fanouts_have_a_fallback_edge_to_their_aggregator() {
        let graph = build_graph(&test_config()).await.unwrap();
        assert!(graph.edge("search_dispatcher").is_some());
        assert!(graph.edge("enrichment_dispatcher").is_some());
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            state_dir: std::env::temp_dir()
                .join(format!("wayfare-registry-test-{:?}-{}", std::time::SystemTime::now(), std::process::id()))
                .to_string_lossy()
                .to_string(),
            ..EngineConfig::default()
        }
    }
}
