//! Flight and ground-transport search: resolves airports for both
//! cities, skips flight search entirely under the short-hop threshold,
//! and always computes ground fares once a distance is known.

use async_trait::async_trait;
use wayfare_providers::flights::FlightProvider;
use wayfare_providers::geocode::GeocodeProvider;
use wayfare_providers::search::WebSearchProvider;
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{stable_id, AgentDecision, PlannerState, PlannerStatePatch, SourceOrigin, Transport, TransportType};

use crate::fare_calculator;
use crate::geo;

/// Below this distance, flights aren't practical — only ground transport
/// is offered.
pub const SHORT_DISTANCE_KM: f64 = 200.0;

pub struct FlightSearchNode {
    flights: FlightProvider,
    web_search: WebSearchProvider,
    geocode: GeocodeProvider,
}

impl FlightSearchNode {
    pub fn new(flights: FlightProvider, web_search: WebSearchProvider, geocode: GeocodeProvider) -> Self {
        Self { flights, web_search, geocode }
    }
}

#[async_trait]
impl GraphNode for FlightSearchNode {
    fn name(&self) -> &str {
        "flight_search"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let Some(request) = &state.trip_request else {
            return Ok(skip("No trip request available."));
        };
        let Some(destination) = request.destination.clone() else {
            return Ok(skip("Destination not yet resolved."));
        };
        let origin = request.origin.clone().unwrap_or_else(|| "Delhi".to_string());

        let mut reasoning = Vec::new();

        let (origin_iata, origin_note) = geo::resolve_iata(&self.geocode, &origin).await;
        let (dest_iata, dest_note) = geo::resolve_iata(&self.geocode, &destination).await;
        if let Some(note) = origin_note {
            reasoning.push(note);
        }
        if let Some(note) = dest_note {
            reasoning.push(note);
        }

        let distance_km = geo::estimate_distance_km(&self.geocode, &origin, &destination).await;

        let is_short_distance = match distance_km {
            Some(km) if km < SHORT_DISTANCE_KM => {
                reasoning.push(format!(
                    "{origin} to {destination} is only {km:.0} km — flights not practical, ground transport only."
                ));
                true
            }
            None => {
                reasoning.push("Could not estimate distance; will attempt flight search.".to_string());
                false
            }
            _ => false,
        };

        let mut flights = Vec::new();
        if !is_short_distance {
            let departure = request
                .start_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "2026-01-01".to_string());

            if let (Some(o), Some(d)) = (origin_iata.as_deref(), dest_iata.as_deref()) {
                let (amadeus, reason) = self.flights.search(o, d, &departure, request.num_travelers.max(1)).await;
                if let Some(r) = reason {
                    reasoning.push(format!("Amadeus search: {r}"));
                }
                flights = amadeus;
            } else {
                reasoning.push("Skipping Amadeus: missing resolved IATA code for origin or destination.".to_string());
            }

            if flights.is_empty() {
                let query = format!("flights from {origin} to {destination} price");
                let (outcome, reason) = self.web_search.search(&query).await;
                if let Some(r) = reason {
                    reasoning.push(format!("Web search fallback: {r}"));
                } else if let Some(outcome) = outcome {
                    flights = synthesize_flights_from_search(&outcome.results, &origin, &destination);
                }
            }
        }

        let ground_transport = match distance_km {
            Some(km) => fare_calculator::all_ground_transport(km),
            None => {
                reasoning.push("Distance unknown — could not calculate ground transport fares.".to_string());
                Vec::new()
            }
        };

        let summary = format!(
            "{} flight option(s), {} ground transport option(s).{}",
            flights.len(),
            ground_transport.len(),
            if is_short_distance { " Short distance — ground only." } else { "" }
        );

        let decision = AgentDecision::new("flight_search", "search_transport", reasoning.join(" "), summary);

        let patch = PlannerStatePatch {
            flight_options: Some(flights),
            ground_transport_options: Some(ground_transport),
            current_stage: Some("flight_search_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "search_aggregator"))
    }
}

fn skip(reason: &str) -> NodeOutcome {
    let decision = AgentDecision::new("flight_search", "skip", reason.to_string(), "Skipped".to_string());
    let patch = PlannerStatePatch {
        flight_options: Some(vec![]),
        ground_transport_options: Some(vec![]),
        current_stage: Some("flight_search_done".to_string()),
        agent_decisions: Some(vec![decision]),
        ..Default::default()
    };
    NodeOutcome::next(patch, "search_aggregator")
}

/// Builds low-confidence flight-shaped entries out of web search hits
/// when Amadeus has nothing. First result gets a Skyscanner booking
/// link, the rest MakeMyTrip.
fn synthesize_flights_from_search(
    results: &[wayfare_providers::search::SearchResult],
    origin: &str,
    destination: &str,
) -> Vec<Transport> {
    results
        .iter()
        .take(5)
        .enumerate()
        .map(|(i, r)| {
            let booking_url = if i == 0 {
                format!("https://www.skyscanner.co.in/transport/flights/{origin}/{destination}/")
            } else {
                format!("https://www.makemytrip.com/flight/search?itinerary={origin}-{destination}")
            };
            Transport {
                id: stable_id(&format!("web-flight-{}-{}", r.url, i)),
                name: r.title.clone(),
                transport_type: TransportType::Flight,
                operator: "Web search result".to_string(),
                total_price: 0.0,
                currency: "INR".to_string(),
                duration_minutes: 0,
                transfers: 0,
                rating: 0.0,
                booking_url: Some(booking_url),
                source_origin: SourceOrigin::TavilyWeb,
                verified: false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wayfare_cache::CacheClient;

    fn provider_set() -> (FlightProvider, WebSearchProvider, GeocodeProvider) {
        let cache = Arc::new(CacheClient::in_memory());
        (
            FlightProvider::new(None, None, cache.clone()),
            WebSearchProvider::new(None, cache.clone()),
            GeocodeProvider::new(cache),
        )
    }

    #[tokio::test]
    async fn short_hop_skips_flight_search_entirely() {
        let (flights, web, geocode) = provider_set();
        let node = FlightSearchNode::new(flights, web, geocode);

        let mut state = PlannerState::new("s", "u", "goa weekend trip");
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Delhi".to_string()),
            destination: Some("Agra".to_string()),
            start_date: None,
            end_date: None,
            budget: Some(10_000),
            num_travelers: 1,
            travel_style: None,
            interests: vec![],
        });

        let outcome = node.run(&state).await.unwrap();
        assert!(outcome.patch.flight_options.unwrap().is_empty());
        assert!(!outcome.patch.ground_transport_options.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_destination_skips_cleanly() {
        let (flights, web, geocode) = provider_set();
        let node = FlightSearchNode::new(flights, web, geocode);

        let mut state = PlannerState::new("s", "u", "plan something");
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
        assert!(outcome.patch.flight_options.unwrap().is_empty());
        assert!(outcome.patch.ground_transport_options.unwrap().is_empty());
    }
}
