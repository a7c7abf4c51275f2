//! Places: Google Places-shaped text search, normalized to `Activity`
//! candidates. Price level is mapped to an estimated rupee figure since
//! the API exposes a coarse enum, not an amount.

use serde::Deserialize;
use std::sync::Arc;

use wayfare_cache::{CacheClient, CacheNamespace};
use wayfare_types::{Activity, SourceOrigin};

#[derive(Debug, Deserialize)]
struct PlacesSearchResponse {
    #[serde(default)]
    places: Vec<PlaceEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct PlaceEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<DisplayName>,
    #[serde(rename = "formattedAddress")]
    formatted_address: Option<String>,
    #[serde(rename = "internationalPhoneNumber")]
    phone: Option<String>,
    #[serde(rename = "rating")]
    rating: Option<f64>,
    #[serde(rename = "priceLevel")]
    price_level: Option<String>,
    location: Option<PlaceLocation>,
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    text: String,
}

#[derive(Debug, Deserialize)]
struct PlaceLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Clone)]
pub struct PlacesProvider {
    cache: Arc<CacheClient>,
    api_key: Option<String>,
}

impl PlacesProvider {
    pub fn new(api_key: Option<String>, cache: Arc<CacheClient>) -> Self {
        Self { cache, api_key }
    }

    pub async fn search_activities(
        &self,
        query: &str,
        lat: f64,
        lng: f64,
        radius_m: f64,
    ) -> (Vec<Activity>, Option<String>) {
        let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) else {
            return (vec![], Some("GOOGLE_PLACES_KEY not configured".to_string()));
        };

        let body = serde_json::json!({
            "textQuery": query,
            "locationBias": {
                "circle": { "center": { "latitude": lat, "longitude": lng }, "radius": radius_m }
            }
        });

        let headers = vec![
            ("X-Goog-Api-Key".to_string(), key.clone()),
            (
                "X-Goog-FieldMask".to_string(),
                "places.id,places.displayName,places.formattedAddress,places.location,places.rating,places.priceLevel,places.internationalPhoneNumber".to_string(),
            ),
        ];

        let doc = match self
            .cache
            .post(CacheNamespace::Places, "https://places.googleapis.com/v1/places:searchText", &body, &headers)
            .await
        {
            Ok(doc) => doc,
            Err(e) => return (vec![], Some(format!("places provider request failed: {e}"))),
        };

        let parsed: PlacesSearchResponse = match serde_json::from_value(doc) {
            Ok(p) => p,
            Err(e) => return (vec![], Some(format!("places provider parse error: {e}"))),
        };

        let activities = parsed
            .places
            .into_iter()
            .filter_map(|p| {
                let name = p.display_name?.text;
                let id = p.id.unwrap_or_else(|| wayfare_types::stable_id(&name));
                let (plat, plng) = p
                    .location
                    .map(|l| (l.latitude, l.longitude))
                    .unwrap_or((lat, lng));
                Some(Activity {
                    id,
                    name,
                    category: "sightseeing".to_string(),
                    duration_hours: 2.0,
                    price: price_level_to_inr(p.price_level.as_deref()),
                    lat: plat,
                    lng: plng,
                    opening_hours: None,
                    phone: p.phone,
                    rating: p.rating.unwrap_or(3.5),
                    source_origin: SourceOrigin::Api,
                    verified: true,
                })
            })
            .collect();

        (activities, None)
    }
}

fn price_level_to_inr(level: Option<&str>) -> f64 {
    match level {
        Some("PRICE_LEVEL_INEXPENSIVE") => 200.0,
        Some("PRICE_LEVEL_MODERATE") => 500.0,
        Some("PRICE_LEVEL_EXPENSIVE") => 1500.0,
        Some("PRICE_LEVEL_VERY_EXPENSIVE") => 2500.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache() -> Arc<CacheClient> {
        Arc::new(CacheClient::in_memory())
    }

    #[test]
    fn price_level_mapping_matches_fixed_table() {
        assert_eq!(price_level_to_inr(Some("PRICE_LEVEL_INEXPENSIVE")), 200.0);
        assert_eq!(price_level_to_inr(Some("PRICE_LEVEL_MODERATE")), 500.0);
        assert_eq!(price_level_to_inr(Some("PRICE_LEVEL_EXPENSIVE")), 1500.0);
        assert_eq!(price_level_to_inr(None), 0.0);
    }

    #[tokio::test]
    async fn unconfigured_key_short_circuits_empty() {
        let provider = PlacesProvider::new(None, test_cache());
        let (activities, reason) = provider.search_activities("temples", 28.6, 77.2, 5000.0).await;
        assert!(activities.is_empty());
        assert!(reason.is_some());
    }
}
