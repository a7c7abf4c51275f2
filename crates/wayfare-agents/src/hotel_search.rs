//! Hotel search: LiteAPI primary, Tavily web search fallback when the
//! API returns nothing.

use async_trait::async_trait;
use wayfare_providers::hotels::HotelProvider;
use wayfare_providers::search::WebSearchProvider;
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{stable_id, AgentDecision, PlannerState, PlannerStatePatch, SourceOrigin, Stay};

pub struct HotelSearchNode {
    hotels: HotelProvider,
    web_search: WebSearchProvider,
}

impl HotelSearchNode {
    pub fn new(hotels: HotelProvider, web_search: WebSearchProvider) -> Self {
        Self { hotels, web_search }
    }
}

#[async_trait]
impl GraphNode for HotelSearchNode {
    fn name(&self) -> &str {
        "hotel_search"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let Some(request) = &state.trip_request else {
            return Ok(skip("No trip request available."));
        };
        let Some(destination) = request.destination.clone() else {
            return Ok(skip("Destination not yet resolved."));
        };

        let nights = request.duration_days().max(1);
        let checkin = request
            .start_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "2026-01-01".to_string());
        let checkout = request
            .end_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "2026-01-03".to_string());

        let mut reasoning = Vec::new();

        let (mut stays, reason) = self
            .hotels
            .search("IN", &destination, &checkin, &checkout, request.num_travelers.max(1), nights)
            .await;
        if let Some(r) = reason {
            reasoning.push(format!("LiteAPI: {r}"));
        }

        if stays.is_empty() {
            let query = format!("best hotels to stay in {destination} India");
            let (outcome, reason) = self.web_search.search(&query).await;
            if let Some(r) = reason {
                reasoning.push(format!("Web search fallback: {r}"));
            } else if let Some(outcome) = outcome {
                stays = synthesize_stays_from_search(&outcome.results, nights);
            }
        }

        let summary = format!("{} hotel option(s) found in {destination}.", stays.len());
        let decision = AgentDecision::new("hotel_search", "search_hotels", reasoning.join(" "), summary);

        let patch = PlannerStatePatch {
            hotel_options: Some(stays),
            current_stage: Some("hotel_search_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "search_aggregator"))
    }
}

fn skip(reason: &str) -> NodeOutcome {
    let decision = AgentDecision::new("hotel_search", "skip", reason.to_string(), "Skipped".to_string());
    let patch = PlannerStatePatch {
        hotel_options: Some(vec![]),
        current_stage: Some("hotel_search_done".to_string()),
        agent_decisions: Some(vec![decision]),
        ..Default::default()
    };
    NodeOutcome::next(patch, "search_aggregator")
}

/// Builds low-confidence stay entries from web search hits, priced from
/// a flat mid-range estimate since search results carry no rate data.
fn synthesize_stays_from_search(results: &[wayfare_providers::search::SearchResult], nights: u32) -> Vec<Stay> {
    const ESTIMATED_PER_NIGHT: f64 = 3000.0;
    results
        .iter()
        .take(5)
        .map(|r| Stay {
            id: stable_id(&format!("web-hotel-{}", r.url)),
            name: r.title.clone(),
            lat: 0.0,
            lng: 0.0,
            star_rating: 3.0,
            price_per_night: ESTIMATED_PER_NIGHT,
            total_price: ESTIMATED_PER_NIGHT * nights as f64,
            amenities: vec![],
            booking_url: None,
            source_origin: SourceOrigin::TavilyWeb,
            verified: false,
        })
        .collect()
}
