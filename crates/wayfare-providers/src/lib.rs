pub mod flights;
pub mod geocode;
pub mod hotels;
pub mod llm;
pub mod places;
pub mod reddit;
pub mod search;
pub mod weather;

use async_trait::async_trait;
use wayfare_types::Candidate;

/// Shared shape every category adapter implements: one search method,
/// returning normalized candidates plus an optional reason when the
/// result is empty. Adapters never propagate an exception into the
/// graph — a missing credential, a timeout, and a malformed response all
/// collapse to `(vec![], Some(reason))`.
#[async_trait]
pub trait Provider<Q, C: Candidate>: Send + Sync {
    async fn search(&self, query: &Q) -> (Vec<C>, Option<String>);
}

pub use flights::FlightProvider;
pub use geocode::{haversine_km, GeocodeProvider, LatLng};
pub use hotels::HotelProvider;
pub use llm::{lenient_parse_json, ChatMessage, LlmClient};
pub use places::PlacesProvider;
pub use reddit::RedditProvider;
pub use search::{SearchOutcome, SearchResult, WebSearchProvider};
pub use weather::{wmo_code_label, WeatherProvider};
