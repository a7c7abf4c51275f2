//! Negotiation models: the shapes the trade-off negotiator produces and
//! `PlannerState` carries downstream.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::candidate::{Activity, Stay, Transport};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyBreakdown {
    pub transport: f64,
    pub stay: f64,
    pub activities: f64,
    pub food: f64,
    pub buffer: f64,
    pub total: f64,
}

impl MoneyBreakdown {
    /// Builds a breakdown with `total` computed as the sum of components
    /// plus buffer.
    pub fn new(transport: f64, stay: f64, activities: f64, food: f64, buffer: f64) -> Self {
        let total = transport + stay + activities + food + buffer;
        Self {
            transport,
            stay,
            activities,
            food,
            buffer,
            total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOffLine {
    pub gain: String,
    pub sacrifice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedOption {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleType {
    BudgetSaver,
    BestValue,
    ExperienceMax,
}

impl BundleType {
    pub fn id(&self) -> &'static str {
        match self {
            BundleType::BudgetSaver => "budget_saver",
            BundleType::BestValue => "best_value",
            BundleType::ExperienceMax => "experience_max",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BundleType::BudgetSaver => "Budget Saver",
            BundleType::BestValue => "Best Value",
            BundleType::ExperienceMax => "Experience Max",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            BundleType::BudgetSaver => "Cheapest viable option, every rupee counts",
            BundleType::BestValue => "Balanced experience at the optimal price point",
            BundleType::ExperienceMax => "Maximum richness, up to +10% over budget",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleChoice {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub transport: Transport,
    pub stay: Stay,
    pub activities: Vec<Activity>,
    pub breakdown: MoneyBreakdown,
    pub experience_score: u8,
    pub cost_score: u8,
    pub convenience_score: u8,
    pub final_score: f64,
    pub tradeoffs: Vec<TradeOffLine>,
    pub rejected: Vec<RejectedOption>,
    pub booking_links: HashMap<String, Option<String>>,
    pub decision_log: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityResult {
    pub bundle_id: String,
    pub passed: bool,
    pub issues: Vec<String>,
    pub suggested_tweaks: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub w_experience: f64,
    pub w_cost: f64,
    pub w_convenience: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            w_experience: 0.45,
            w_cost: 0.35,
            w_convenience: 0.20,
        }
    }
}

impl ScoringWeights {
    pub fn compute(&self, experience: f64, cost: f64, convenience: f64) -> f64 {
        let raw = self.w_experience * experience + self.w_cost * cost + self.w_convenience * convenience;
        let clamped = raw.clamp(0.0, 100.0);
        (clamped * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WhatIfEntry {
    pub delta_budget: i64,
    #[serde(default = "default_stage")]
    pub applied_at_stage: String,
    #[serde(default)]
    pub resulting_bundle_ids: Vec<String>,
}

fn default_stage() -> String {
    "negotiator".to_string()
}
