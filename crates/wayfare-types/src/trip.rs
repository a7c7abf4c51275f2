use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TripRequest {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default = "default_party_size")]
    pub num_travelers: u32,
    #[serde(default)]
    pub travel_style: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

fn default_party_size() -> u32 {
    1
}

impl TripRequest {
    pub fn duration_days(&self) -> u32 {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end > start => (end - start).num_days() as u32,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BudgetTracker {
    pub allocated: HashMap<String, f64>,
    pub spent: HashMap<String, f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub day: u32,
    pub name: String,
    pub category: String,
    pub cost: f64,
    pub verified: bool,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Trip {
    pub destination: String,
    pub duration_days: u32,
    pub items: Vec<ItineraryItem>,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibeScore {
    pub overall: u8,
    pub breakdown: HashMap<String, u8>,
    pub tagline: String,
    #[serde(default)]
    pub unavailable: bool,
}
