//! Heterogeneous candidate records: transport, stay, activity.
//!
//! Each category shares a common interface (`id`, `price`, `source_origin`,
//! `verified`) plus category-specific payload, per the sum-type pattern
//! named in the design notes. Candidates are the unit the dedup reducer
//! and the negotiator both operate over.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    Api,
    Curated,
    Llm,
    TavilyWeb,
    FareCalculator,
    Estimated,
}

impl Default for SourceOrigin {
    fn default() -> Self {
        SourceOrigin::Estimated
    }
}

/// Fields common to every candidate category, regardless of payload.
pub trait Candidate {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn price(&self) -> f64;
    fn source_origin(&self) -> SourceOrigin;
    fn verified(&self) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    Flight,
    Train,
    Bus,
    Cab,
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transport {
    pub id: String,
    pub name: String,
    pub transport_type: TransportType,
    pub operator: String,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub transfers: u32,
    #[serde(default = "default_rating")]
    pub rating: f64,
    #[serde(default)]
    pub booking_url: Option<String>,
    #[serde(default)]
    pub source_origin: SourceOrigin,
    #[serde(default)]
    pub verified: bool,
}

fn default_duration_minutes() -> u32 {
    120
}

fn default_rating() -> f64 {
    3.5
}

impl Candidate for Transport {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn price(&self) -> f64 {
        self.total_price
    }
    fn source_origin(&self) -> SourceOrigin {
        self.source_origin
    }
    fn verified(&self) -> bool {
        self.verified
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stay {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    #[serde(default = "default_star_rating")]
    pub star_rating: f64,
    #[serde(default)]
    pub price_per_night: f64,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub booking_url: Option<String>,
    #[serde(default)]
    pub source_origin: SourceOrigin,
    #[serde(default)]
    pub verified: bool,
}

fn default_star_rating() -> f64 {
    3.0
}

impl Candidate for Stay {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn price(&self) -> f64 {
        self.total_price
    }
    fn source_origin(&self) -> SourceOrigin {
        self.source_origin
    }
    fn verified(&self) -> bool {
        self.verified
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_duration_hours")]
    pub duration_hours: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_rating")]
    pub rating: f64,
    #[serde(default)]
    pub source_origin: SourceOrigin,
    #[serde(default)]
    pub verified: bool,
}

fn default_duration_hours() -> f64 {
    2.0
}

impl Candidate for Activity {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn price(&self) -> f64 {
        self.price
    }
    fn source_origin(&self) -> SourceOrigin {
        self.source_origin
    }
    fn verified(&self) -> bool {
        self.verified
    }
}

/// Dedup key precedence: id, else name, else title (not modeled
/// separately here since our records always carry `name`), else a
/// stable string.
pub fn dedup_key_for_value(value: &serde_json::Value) -> String {
    if let Some(obj) = value.as_object() {
        if let Some(id) = obj.get("id").and_then(|v| v.as_str()) {
            return id.to_string();
        }
        if let Some(name) = obj.get("name").and_then(|v| v.as_str()) {
            return name.to_string();
        }
        if let Some(title) = obj.get("title").and_then(|v| v.as_str()) {
            return title.to_string();
        }
    }
    value.to_string()
}
