//! Flights: Amadeus-shaped OAuth2 client-credentials token endpoint plus
//! a flight-offers search endpoint. Currency normalization converts
//! EUR/USD/GBP offers into INR with fixed multipliers.

use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use wayfare_cache::{CacheClient, CacheNamespace};
use wayfare_types::{SourceOrigin, Transport, TransportType};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<Offer>,
}

#[derive(Debug, Deserialize)]
struct Offer {
    itineraries: Vec<Itinerary>,
    price: Price,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(rename = "carrierCode")]
    carrier_code: Option<String>,
    number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(rename = "grandTotal")]
    grand_total: String,
    currency: String,
}

#[derive(Clone)]
pub struct FlightProvider {
    http: Client,
    cache: Arc<CacheClient>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl FlightProvider {
    pub fn new(client_id: Option<String>, client_secret: Option<String>, cache: Arc<CacheClient>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with static config");
        Self {
            http,
            cache,
            client_id,
            client_secret,
        }
    }

    pub async fn search(
        &self,
        origin_iata: &str,
        destination_iata: &str,
        departure_date: &str,
        adults: u32,
    ) -> (Vec<Transport>, Option<String>) {
        let (Some(id), Some(secret)) = (self.client_id.as_ref(), self.client_secret.as_ref()) else {
            return (vec![], Some("AMADEUS_CLIENT_ID/SECRET not configured".to_string()));
        };
        if id.trim().is_empty() || secret.trim().is_empty() {
            return (vec![], Some("AMADEUS_CLIENT_ID/SECRET not configured".to_string()));
        }

        let Some(token) = self.fetch_token(id, secret).await else {
            return (vec![], Some("amadeus token exchange failed".to_string()));
        };

        let params = vec![
            ("originLocationCode".to_string(), origin_iata.to_string()),
            ("destinationLocationCode".to_string(), destination_iata.to_string()),
            ("departureDate".to_string(), departure_date.to_string()),
            ("adults".to_string(), adults.to_string()),
            ("max".to_string(), "10".to_string()),
        ];
        let headers = vec![("Authorization".to_string(), format!("Bearer {token}"))];

        let doc = match self
            .cache
            .get(CacheNamespace::Flights, "https://test.api.amadeus.com/v2/shopping/flight-offers", &params, &headers)
            .await
        {
            Ok(doc) => doc,
            Err(e) => return (vec![], Some(format!("flight provider request failed: {e}"))),
        };

        let parsed: OffersResponse = match serde_json::from_value(doc) {
            Ok(p) => p,
            Err(e) => return (vec![], Some(format!("flight provider parse error: {e}"))),
        };

        let offers = parsed
            .data
            .into_iter()
            .filter_map(|offer| normalize_offer(offer))
            .collect();

        (offers, None)
    }

    /// Credential exchange, not cached: a token is short-lived and
    /// reusing a stale one just trades one round trip for another.
    async fn fetch_token(&self, id: &str, secret: &str) -> Option<String> {
        let resp = self
            .http
            .post("https://test.api.amadeus.com/v1/security/oauth2/token")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", id),
                ("client_secret", secret),
            ])
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let parsed: TokenResponse = resp.json().await.ok()?;
        Some(parsed.access_token)
    }
}

fn normalize_offer(offer: Offer) -> Option<Transport> {
    let itinerary = offer.itineraries.into_iter().next()?;
    let first_segment = itinerary.segments.first()?;
    let carrier = first_segment.carrier_code.clone().unwrap_or_else(|| "XX".to_string());
    let number = first_segment.number.clone().unwrap_or_default();
    let transfers = itinerary.segments.len().saturating_sub(1) as u32;

    let raw_price: f64 = offer.price.grand_total.parse().ok()?;
    let total_price_inr = normalize_to_inr(raw_price, &offer.price.currency);

    let name = format!("{carrier} {number}");
    Some(Transport {
        id: wayfare_types::stable_id(&format!("{name}-{total_price_inr}")),
        name: name.clone(),
        transport_type: TransportType::Flight,
        operator: carrier,
        total_price: total_price_inr,
        currency: "INR".to_string(),
        duration_minutes: 120,
        transfers,
        rating: 3.5,
        booking_url: None,
        source_origin: SourceOrigin::Api,
        verified: true,
    })
}

/// Fixed currency multipliers into INR: EUR x93, USD x83, GBP x105.
pub fn normalize_to_inr(amount: f64, currency: &str) -> f64 {
    match currency {
        "EUR" => amount * 93.0,
        "USD" => amount * 83.0,
        "GBP" => amount * 105.0,
        "INR" => amount,
        _ => amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache() -> Arc<CacheClient> {
        Arc::new(CacheClient::in_memory())
    }

    #[test]
    fn currency_normalization_matches_fixed_multipliers() {
        assert_eq!(normalize_to_inr(100.0, "EUR"), 9300.0);
        assert_eq!(normalize_to_inr(100.0, "USD"), 8300.0);
        assert_eq!(normalize_to_inr(100.0, "GBP"), 10500.0);
    }

    #[tokio::test]
    async fn unconfigured_credentials_short_circuit_empty() {
        let provider = FlightProvider::new(None, None, test_cache());
        let (offers, reason) = provider.search("DEL", "BOM", "2026-09-01", 1).await;
        assert!(offers.is_empty());
        assert!(reason.is_some());
    }
}
