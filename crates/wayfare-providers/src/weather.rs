//! Weather: a free Open-Meteo-shaped daily forecast endpoint. WMO weather
//! codes are mapped to human strings per a fixed table.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use wayfare_cache::{CacheClient, CacheNamespace};

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    precipitation_probability_max: Vec<f64>,
    precipitation_sum: Vec<f64>,
    weathercode: Vec<u32>,
    windspeed_10m_max: Vec<f64>,
}

#[derive(Clone)]
pub struct WeatherProvider {
    cache: Arc<CacheClient>,
}

impl WeatherProvider {
    pub fn new(cache: Arc<CacheClient>) -> Self {
        Self { cache }
    }

    pub async fn forecast(&self, lat: f64, lng: f64, forecast_days: u32) -> (Option<Value>, Option<String>) {
        let days = forecast_days.min(16);
        let params = vec![
            ("latitude".to_string(), lat.to_string()),
            ("longitude".to_string(), lng.to_string()),
            (
                "daily".to_string(),
                "temperature_2m_max,temperature_2m_min,precipitation_probability_max,precipitation_sum,weathercode,windspeed_10m_max"
                    .to_string(),
            ),
            ("forecast_days".to_string(), days.to_string()),
            ("timezone".to_string(), "auto".to_string()),
        ];

        let doc = match self
            .cache
            .get(CacheNamespace::Weather, "https://api.open-meteo.com/v1/forecast", &params, &[])
            .await
        {
            Ok(doc) => doc,
            Err(e) => return (None, Some(format!("weather provider request failed: {e}"))),
        };

        let parsed: OpenMeteoResponse = match serde_json::from_value(doc) {
            Ok(p) => p,
            Err(e) => return (None, Some(format!("weather provider parse error: {e}"))),
        };

        let days_json: Vec<Value> = parsed
            .daily
            .time
            .iter()
            .enumerate()
            .map(|(i, date)| {
                json!({
                    "date": date,
                    "temp_min": parsed.daily.temperature_2m_min.get(i),
                    "temp_max": parsed.daily.temperature_2m_max.get(i),
                    "precipitation_probability_max": parsed.daily.precipitation_probability_max.get(i),
                    "precipitation_sum": parsed.daily.precipitation_sum.get(i),
                    "weathercode": parsed.daily.weathercode.get(i),
                    "condition": parsed.daily.weathercode.get(i).map(|c| wmo_code_label(*c)),
                    "windspeed_10m_max": parsed.daily.windspeed_10m_max.get(i),
                })
            })
            .collect();

        (Some(json!({ "days": days_json, "source": "open-meteo" })), None)
    }
}

/// WMO weather interpretation codes, per the Open-Meteo documentation.
pub fn wmo_code_label(code: u32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 | 2 | 3 => "Partly cloudy",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 => "Snow fall",
        77 => "Snow grains",
        80 | 81 | 82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_labels() {
        assert_eq!(wmo_code_label(0), "Clear sky");
        assert_eq!(wmo_code_label(95), "Thunderstorm");
    }

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(wmo_code_label(12345), "Unknown");
    }
}
