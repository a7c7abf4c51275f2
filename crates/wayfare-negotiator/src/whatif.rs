//! "What if my budget were different?" re-runs the negotiator alone —
//! never the research nodes upstream of it.

use wayfare_types::{PlannerState, WhatIfEntry};

use crate::engine::{generate_bundles, NegotiationInput};

/// Applies a budget delta and regenerates bundles in place. Research
/// state (flights, hotels, activities already gathered) is reused
/// as-is; only scoring and bundle selection re-run.
pub fn apply_what_if(state: &mut PlannerState, delta_budget: i64) {
    state.what_if_delta += delta_budget;
    state.negotiator_cache_key = None;
    state.bundles.clear();

    let Some(trip_request) = state.trip_request.clone() else {
        state.errors.push("cannot apply what-if: no trip request on file".to_string());
        return;
    };
    let Some(budget) = trip_request.budget else {
        state.errors.push("cannot apply what-if: trip request has no budget".to_string());
        return;
    };
    let destination = trip_request.destination.clone().unwrap_or_default();
    let start_date = trip_request
        .start_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    let end_date = trip_request.end_date.map(|d| d.to_string()).unwrap_or_default();

    let input = NegotiationInput {
        transports: &state.flight_options,
        ground_transport: &state.ground_transport_options,
        stays: &state.hotel_options,
        activities: &state.activity_options,
        budget,
        duration_days: trip_request.duration_days(),
        num_travelers: trip_request.num_travelers,
        interests: &trip_request.interests,
        what_if_delta: state.what_if_delta,
        destination: &destination,
        start_date: &start_date,
        end_date: &end_date,
    };

    let outcome = generate_bundles(&input);
    let bundle_ids: Vec<String> = outcome.bundles.iter().map(|b| b.id.clone()).collect();
    state.bundles = outcome.bundles;
    state.negotiator_cache_key = Some(outcome.cache_key);
    state.negotiation_log.extend(outcome.log);
    state.what_if_history.push(WhatIfEntry {
        delta_budget,
        applied_at_stage: "negotiator".to_string(),
        resulting_bundle_ids: bundle_ids,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_types::TripRequest;

    fn state_with_budget(budget: u64) -> PlannerState {
        let mut state = PlannerState::new("s1", "u1", "plan a trip");
        state.trip_request = Some(TripRequest {
            origin: Some("Delhi".to_string()),
            destination: Some("Rishikesh".to_string()),
            start_date: None,
            end_date: None,
            budget: Some(budget),
            num_travelers: 2,
            travel_style: None,
            interests: vec!["adventure".to_string()],
        });
        state
    }

    #[test]
    fn what_if_regenerates_bundles_and_records_history() {
        let mut state = state_with_budget(15000);
        apply_what_if(&mut state, 5000);
        assert_eq!(state.what_if_delta, 5000);
        assert_eq!(state.bundles.len(), 3);
        assert_eq!(state.what_if_history.len(), 1);
        assert_eq!(state.what_if_history[0].delta_budget, 5000);
    }

    #[test]
    fn what_if_without_trip_request_records_error_not_panic() {
        let mut state = PlannerState::new("s1", "u1", "plan a trip");
        apply_what_if(&mut state, 1000);
        assert!(state.bundles.is_empty());
        assert!(!state.errors.is_empty());
    }

    #[test]
    fn repeated_what_if_accumulates_delta_and_history() {
        let mut state = state_with_budget(15000);
        apply_what_if(&mut state, 2000);
        apply_what_if(&mut state, -1000);
        assert_eq!(state.what_if_delta, 1000);
        assert_eq!(state.what_if_history.len(), 2);
    }
}
