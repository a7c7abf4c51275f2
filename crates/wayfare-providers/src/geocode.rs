//! Geocoding: a curated dictionary of major Indian cities first, then a
//! Nominatim-shaped free fallback with a required User-Agent header and
//! a rate limit of at least one second between calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use wayfare_cache::{CacheClient, CacheNamespace};

#[derive(Debug, Clone, Copy)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

fn curated_cities() -> HashMap<&'static str, LatLng> {
    let mut m = HashMap::new();
    m.insert("delhi", LatLng { lat: 28.6139, lng: 77.2090 });
    m.insert("mumbai", LatLng { lat: 19.0760, lng: 72.8777 });
    m.insert("bengaluru", LatLng { lat: 12.9716, lng: 77.5946 });
    m.insert("bangalore", LatLng { lat: 12.9716, lng: 77.5946 });
    m.insert("jaipur", LatLng { lat: 26.9124, lng: 75.7873 });
    m.insert("rishikesh", LatLng { lat: 30.0869, lng: 78.2676 });
    m.insert("agra", LatLng { lat: 27.1767, lng: 78.0081 });
    m.insert("goa", LatLng { lat: 15.2993, lng: 74.1240 });
    m.insert("manali", LatLng { lat: 32.2432, lng: 77.1892 });
    m.insert("udaipur", LatLng { lat: 24.5854, lng: 73.7125 });
    m.insert("varanasi", LatLng { lat: 25.3176, lng: 82.9739 });
    m.insert("kolkata", LatLng { lat: 22.5726, lng: 88.3639 });
    m.insert("chennai", LatLng { lat: 13.0827, lng: 80.2707 });
    m.insert("hyderabad", LatLng { lat: 17.3850, lng: 78.4867 });
    m.insert("pune", LatLng { lat: 18.5204, lng: 73.8567 });
    m
}

#[derive(Debug, Deserialize)]
struct NominatimEntry {
    lat: String,
    lon: String,
}

#[derive(Clone)]
pub struct GeocodeProvider {
    cache: Arc<CacheClient>,
    curated: HashMap<&'static str, LatLng>,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl GeocodeProvider {
    pub fn new(cache: Arc<CacheClient>) -> Self {
        Self {
            cache,
            curated: curated_cities(),
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    /// Curated dictionary first; falls back to a Nominatim-shaped lookup,
    /// rate-limited to at least one call per second. Returns `None` if
    /// both sources fail — callers (flight_search) then try an LLM
    /// coordinate fallback before giving up.
    pub async fn geocode(&self, place: &str) -> Option<LatLng> {
        let key = place.trim().to_lowercase();
        if let Some(coords) = self.curated.get(key.as_str()) {
            return Some(*coords);
        }
        self.geocode_nominatim(place).await
    }

    async fn geocode_nominatim(&self, place: &str) -> Option<LatLng> {
        {
            let mut guard = self.last_call.lock().await;
            if let Some(last) = *guard {
                let elapsed = last.elapsed();
                if elapsed < Duration::from_secs(1) {
                    tokio::time::sleep(Duration::from_secs(1) - elapsed).await;
                }
            }
            *guard = Some(Instant::now());
        }

        let params = vec![
            ("q".to_string(), place.to_string()),
            ("format".to_string(), "json".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        let headers = vec![(
            "User-Agent".to_string(),
            "wayfare-engine/0.1 (+https://example.invalid/contact)".to_string(),
        )];

        let doc = self
            .cache
            .get(CacheNamespace::Generic, "https://nominatim.openstreetmap.org/search", &params, &headers)
            .await
            .ok()?;
        let entries: Vec<NominatimEntry> = serde_json::from_value(doc).ok()?;
        let first = entries.into_iter().next()?;
        Some(LatLng {
            lat: first.lat.parse().ok()?,
            lng: first.lon.parse().ok()?,
        })
    }
}

/// Great-circle distance in kilometers between two points, used by
/// `flight_search` to decide whether a hop is short enough to skip
/// flight APIs.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache() -> Arc<CacheClient> {
        Arc::new(CacheClient::in_memory())
    }

    #[test]
    fn haversine_identity_is_zero() {
        let p = LatLng { lat: 28.6139, lng: 77.2090 };
        assert!(haversine_km(p, p) < 1e-6);
    }

    #[test]
    fn delhi_mumbai_distance_matches_known_value() {
        let delhi = LatLng { lat: 28.6139, lng: 77.2090 };
        let mumbai = LatLng { lat: 19.0760, lng: 72.8777 };
        let d = haversine_km(delhi, mumbai);
        assert!((d - 1154.0).abs() < 20.0, "distance was {d}");
    }

    #[tokio::test]
    async fn curated_lookup_does_not_touch_network() {
        let provider = GeocodeProvider::new(test_cache());
        let coords = provider.geocode("Delhi").await.unwrap();
        assert!((coords.lat - 28.6139).abs() < 0.01);
    }
}
