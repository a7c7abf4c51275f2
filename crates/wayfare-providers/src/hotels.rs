//! Hotels: LiteAPI-shaped `/data/hotels` + optional `/data/rates`. When
//! rates are unavailable, price is estimated from star rating via the
//! fixed table.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use wayfare_cache::{CacheClient, CacheNamespace};
use wayfare_types::{SourceOrigin, Stay};

#[derive(Debug, Deserialize)]
struct HotelsResponse {
    #[serde(default)]
    data: Vec<HotelEntry>,
    #[serde(default)]
    hotels: Vec<HotelEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct HotelEntry {
    id: String,
    name: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
    #[serde(default)]
    stars: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[derive(Clone)]
pub struct HotelProvider {
    cache: Arc<CacheClient>,
    api_key: Option<String>,
}

impl HotelProvider {
    pub fn new(api_key: Option<String>, cache: Arc<CacheClient>) -> Self {
        Self { cache, api_key }
    }

    pub async fn search(
        &self,
        country_code: &str,
        city_name: &str,
        checkin: &str,
        checkout: &str,
        adults: u32,
        nights: u32,
    ) -> (Vec<Stay>, Option<String>) {
        let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) else {
            return (vec![], Some("LITEAPI_KEY not configured".to_string()));
        };

        let params = vec![
            ("countryCode".to_string(), country_code.to_string()),
            ("cityName".to_string(), city_name.to_string()),
        ];
        let headers = vec![("X-API-Key".to_string(), key.clone())];

        let doc = match self
            .cache
            .get(CacheNamespace::Hotels, "https://api.liteapi.travel/v3.0/data/hotels", &params, &headers)
            .await
        {
            Ok(doc) => doc,
            Err(e) => return (vec![], Some(format!("hotel provider request failed: {e}"))),
        };

        let parsed: HotelsResponse = match serde_json::from_value(doc) {
            Ok(p) => p,
            Err(e) => return (vec![], Some(format!("hotel provider parse error: {e}"))),
        };

        let entries: Vec<HotelEntry> = if !parsed.data.is_empty() { parsed.data } else { parsed.hotels };
        if entries.is_empty() {
            return (vec![], Some("hotel provider returned no entries".to_string()));
        }

        let hotel_ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let rates = self
            .fetch_rates(key, &hotel_ids, checkin, checkout, adults)
            .await
            .unwrap_or_default();

        let stays = entries
            .into_iter()
            .map(|e| {
                let stars = e.stars.unwrap_or(3.0);
                let (per_night, source) = match rates.get(&e.id) {
                    Some(rate) => (*rate, SourceOrigin::Api),
                    None => (estimate_price_from_stars(stars), SourceOrigin::Estimated),
                };
                Stay {
                    id: e.id,
                    name: e.name,
                    lat: e.latitude,
                    lng: e.longitude,
                    star_rating: stars,
                    price_per_night: per_night,
                    total_price: per_night * nights as f64,
                    amenities: vec![],
                    booking_url: None,
                    source_origin: source,
                    verified: source == SourceOrigin::Api,
                }
            })
            .collect();

        (stays, None)
    }

    async fn fetch_rates(
        &self,
        key: &str,
        hotel_ids: &[&str],
        checkin: &str,
        checkout: &str,
        adults: u32,
    ) -> Option<HashMap<String, f64>> {
        let params = vec![
            ("hotelIds".to_string(), hotel_ids.join(",")),
            ("checkin".to_string(), checkin.to_string()),
            ("checkout".to_string(), checkout.to_string()),
            ("adults".to_string(), adults.to_string()),
        ];
        let headers = vec![("X-API-Key".to_string(), key.to_string())];

        let doc = self
            .cache
            .get(CacheNamespace::Hotels, "https://api.liteapi.travel/v3.0/data/rates", &params, &headers)
            .await
            .ok()?;
        let parsed: RatesResponse = serde_json::from_value(doc).ok()?;
        Some(parsed.rates)
    }
}

/// Fixed stars→per-night-INR estimate used when the rates endpoint is
/// absent or unconfigured.
pub fn estimate_price_from_stars(stars: f64) -> f64 {
    let bucket = stars.round().clamp(1.0, 5.0) as u32;
    match bucket {
        1 => 800.0,
        2 => 1500.0,
        3 => 3000.0,
        4 => 6000.0,
        _ => 15000.0,
    }
}
