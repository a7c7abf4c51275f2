//! City distance and airport-resolution helpers shared by `flight_search`,
//! `weather_check`, and `activity_search`.

use wayfare_providers::geocode::{haversine_km, GeocodeProvider, LatLng};

struct CityAirport {
    name: &'static str,
    iata: &'static str,
    lat: f64,
    lng: f64,
}

/// Major Indian cities with scheduled commercial airports. Smaller towns
/// with no airport of their own fall through to nearest-airport
/// resolution below.
const AIRPORT_CITIES: &[CityAirport] = &[
    CityAirport { name: "delhi", iata: "DEL", lat: 28.6139, lng: 77.2090 },
    CityAirport { name: "mumbai", iata: "BOM", lat: 19.0760, lng: 72.8777 },
    CityAirport { name: "bengaluru", iata: "BLR", lat: 12.9716, lng: 77.5946 },
    CityAirport { name: "bangalore", iata: "BLR", lat: 12.9716, lng: 77.5946 },
    CityAirport { name: "jaipur", iata: "JAI", lat: 26.9124, lng: 75.7873 },
    CityAirport { name: "goa", iata: "GOI", lat: 15.2993, lng: 74.1240 },
    CityAirport { name: "udaipur", iata: "UDR", lat: 24.5854, lng: 73.7125 },
    CityAirport { name: "varanasi", iata: "VNS", lat: 25.3176, lng: 82.9739 },
    CityAirport { name: "kolkata", iata: "CCU", lat: 22.5726, lng: 88.3639 },
    CityAirport { name: "chennai", iata: "MAA", lat: 13.0827, lng: 80.2707 },
    CityAirport { name: "hyderabad", iata: "HYD", lat: 17.3850, lng: 78.4867 },
    CityAirport { name: "pune", iata: "PNQ", lat: 18.5204, lng: 73.8567 },
];

/// Resolves a free-text city name to an IATA code, falling back to the
/// nearest city in [`AIRPORT_CITIES`] by haversine distance when the
/// named place (e.g. "Rishikesh", "Manali") has no airport of its own.
/// Returns `(iata_code, note)` where `note` is set only on the
/// nearest-airport fallback path, carrying a user-facing explanation of
/// which city's airport was substituted.
pub async fn resolve_iata(geocode: &GeocodeProvider, city: &str) -> (Option<String>, Option<String>) {
    let key = city.trim().to_lowercase();
    if let Some(direct) = AIRPORT_CITIES.iter().find(|c| c.name == key) {
        return (Some(direct.iata.to_string()), None);
    }

    let Some(coords) = geocode.geocode(city).await else {
        return (None, Some(format!("'{city}' has no known airport and coordinates unavailable.")));
    };

    let nearest = AIRPORT_CITIES
        .iter()
        .min_by(|a, b| {
            let da = haversine_km(coords, LatLng { lat: a.lat, lng: a.lng });
            let db = haversine_km(coords, LatLng { lat: b.lat, lng: b.lng });
            da.partial_cmp(&db).unwrap()
        });

    match nearest {
        Some(airport) => (
            Some(airport.iata.to_string()),
            Some(format!("'{city}' has no airport — using nearest: {} ({})", airport.name, airport.iata)),
        ),
        None => (None, Some(format!("'{city}' has no known airport."))),
    }
}

/// Estimated straight-line distance between two place names, or `None`
/// if either fails to geocode.
pub async fn estimate_distance_km(geocode: &GeocodeProvider, origin: &str, destination: &str) -> Option<f64> {
    let o = geocode.geocode(origin).await?;
    let d = geocode.geocode(destination).await?;
    Some(haversine_km(o, d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wayfare_cache::CacheClient;

    fn test_geocode() -> GeocodeProvider {
        GeocodeProvider::new(Arc::new(CacheClient::in_memory()))
    }

    #[tokio::test]
    async fn known_city_resolves_directly() {
        let geo = test_geocode();
        let (iata, note) = resolve_iata(&geo, "Mumbai").await;
        assert_eq!(iata.as_deref(), Some("BOM"));
        assert!(note.is_none());
    }

    #[tokio::test]
    async fn airportless_hill_town_falls_back_to_nearest() {
        let geo = test_geocode();
        let (iata, note) = resolve_iata(&geo, "Rishikesh").await;
        assert!(iata.is_some());
        assert!(note.is_some());
    }

    #[tokio::test]
    async fn haversine_identity_via_estimate_distance() {
        let geo = test_geocode();
        let d = estimate_distance_km(&geo, "Delhi", "Delhi").await.unwrap();
        assert!(d < 1e-6);
    }
}
