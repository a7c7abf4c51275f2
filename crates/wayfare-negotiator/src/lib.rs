//! Deterministic trade-off negotiation: turns raw transport/stay/activity
//! candidates into three ranked, explained, budget-feasible bundles.

pub mod cache;
pub mod demo;
pub mod engine;
pub mod feasibility;
pub mod scoring;
pub mod whatif;

pub use cache::cache_key;
pub use engine::{effective_budget, generate_bundles, NegotiationInput, NegotiationOutcome};
pub use whatif::apply_what_if;
