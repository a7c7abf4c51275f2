//! Cost, experience, and convenience scoring, ported formula-for-formula
//! from `_cost_score` / `_experience_score` / `_convenience_score` in the
//! original negotiator.

use std::collections::HashSet;

use wayfare_types::{Activity, MoneyBreakdown, Transport, Stay};

pub const FOOD_PER_PERSON_PER_DAY: f64 = 800.0;
pub const BUFFER_FRACTION: f64 = 0.05;
const OVER_BUDGET_PENALTY: f64 = 2.5;

pub fn build_breakdown(
    transport: &Transport,
    stay: &Stay,
    activities: &[Activity],
    duration_days: u32,
    num_travelers: u32,
) -> MoneyBreakdown {
    let transport_cost = transport.total_price;
    let stay_cost = stay.price_per_night * duration_days as f64;
    let activities_cost: f64 = activities.iter().map(|a| a.price).sum::<f64>() * num_travelers as f64;
    let food_cost = FOOD_PER_PERSON_PER_DAY * duration_days as f64 * num_travelers as f64;
    let subtotal = transport_cost + stay_cost + activities_cost + food_cost;
    let buffer = (subtotal * BUFFER_FRACTION).round();
    MoneyBreakdown::new(transport_cost, stay_cost, activities_cost, food_cost, buffer)
}

/// `r = total / (budget + what_if_delta)`. Piecewise linear below 1.0,
/// penalized above it.
pub fn cost_score(total: f64, effective_budget: f64) -> u8 {
    if effective_budget <= 0.0 {
        return 50;
    }
    let r = total / effective_budget;
    let score = if r <= 0.70 {
        100.0
    } else if r <= 0.85 {
        100.0 - (r - 0.70) / 0.15 * 20.0
    } else if r <= 1.00 {
        80.0 - (r - 0.85) / 0.15 * 40.0
    } else {
        let over = (r - 1.0) * OVER_BUDGET_PENALTY;
        (40.0 - over * 40.0).max(0.0)
    };
    score.round().clamp(0.0, 100.0) as u8
}

pub fn experience_score(
    transport: &Transport,
    stay: &Stay,
    activities: &[Activity],
    interests: &HashSet<String>,
) -> u8 {
    let stay_pts = ((stay.star_rating / 5.0) * 30.0).min(30.0);

    let count_pts = (activities.len() as f64 * 2.5).min(15.0);
    let avg_rating = if activities.is_empty() {
        3.5
    } else {
        activities.iter().map(|a| a.rating).sum::<f64>() / activities.len() as f64
    };
    let rating_pts = ((avg_rating / 5.0) * 15.0).min(15.0);
    let matched = activities
        .iter()
        .filter(|a| interests.contains(&a.category.to_lowercase()))
        .count();
    let interest_pts = (matched as f64 * 3.0).min(10.0);

    let t_rating_pts = ((transport.rating / 5.0) * 12.0).min(12.0);
    let t_duration_pts = (8.0
        - (transport.duration_minutes as f64 / 60.0) * 0.5
        - transport.transfers as f64 * 2.0)
        .max(0.0);

    let distinct_categories: HashSet<&str> = activities.iter().map(|a| a.category.as_str()).collect();
    let variety_pts = (distinct_categories.len() as f64 * 2.0).min(10.0);

    let total = stay_pts + count_pts + rating_pts + interest_pts + t_rating_pts + t_duration_pts + variety_pts;
    total.round().clamp(0.0, 100.0) as u8
}

pub fn convenience_score(
    transport: &Transport,
    stay: &Stay,
    activities: &[Activity],
    duration_days: u32,
) -> u8 {
    let mut score: f64 = 70.0;

    let hours = transport.duration_minutes as f64 / 60.0;
    if hours > 8.0 {
        score -= 20.0;
    } else if hours > 4.0 {
        score -= 10.0;
    }
    score -= 8.0 * transport.transfers as f64;

    let total_activity_hours: f64 = activities.iter().map(|a| a.duration_hours).sum();
    let avg_daily_hours = if duration_days == 0 {
        total_activity_hours
    } else {
        total_activity_hours / duration_days as f64
    };
    if avg_daily_hours > 10.0 {
        score -= 20.0;
    } else if avg_daily_hours > 7.0 {
        score -= 10.0;
    } else if avg_daily_hours < 4.0 {
        score += 10.0;
    }

    if transport.booking_url.is_some() {
        score += 8.0;
    }
    if stay.booking_url.is_some() {
        score += 7.0;
    }

    score.round().clamp(0.0, 100.0) as u8
}
