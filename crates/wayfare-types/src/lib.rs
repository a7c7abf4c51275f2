pub mod candidate;
pub mod decision;
pub mod ids;
pub mod negotiation;
pub mod state;
pub mod trip;

pub use candidate::{dedup_key_for_value, Activity, Candidate, SourceOrigin, Stay, Transport, TransportType};
pub use decision::AgentDecision;
pub use ids::stable_id;
pub use negotiation::{
    BundleChoice, BundleType, FeasibilityResult, MoneyBreakdown, RejectedOption, ScoringWeights,
    TradeOffLine, WhatIfEntry,
};
pub use state::{IntentType, PlannerState, PlannerStatePatch};
pub use trip::{BudgetTracker, ItineraryItem, Trip, TripRequest, VibeScore};
