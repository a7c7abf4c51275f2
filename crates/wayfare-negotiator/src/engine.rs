//! The negotiation pipeline itself: normalize, preselect, score every
//! combo, pick three distinct winners, attach rationale, validate
//! feasibility — six steps in sequence, each its own function below.

use std::collections::{HashMap, HashSet};

use wayfare_types::{
    Activity, BundleChoice, MoneyBreakdown, RejectedOption, Stay, Transport, TradeOffLine,
};

use crate::cache::cache_key;
use crate::demo::{demo_activities, demo_stays, demo_transport};
use crate::feasibility::validate_and_repair;
use crate::scoring::{build_breakdown, convenience_score, cost_score, experience_score};

const K_TOP: usize = 6;
const K_ACTIVITIES: usize = 12;
const PRODUCT_CAP: usize = 6;
const ACTIVITY_SUBSET_SIZES: [usize; 3] = [3, 5, 7];

pub struct NegotiationInput<'a> {
    pub transports: &'a [Transport],
    pub ground_transport: &'a [Transport],
    pub stays: &'a [Stay],
    pub activities: &'a [Activity],
    pub budget: u64,
    pub duration_days: u32,
    pub num_travelers: u32,
    pub interests: &'a [String],
    pub what_if_delta: i64,
    pub destination: &'a str,
    pub start_date: &'a str,
    pub end_date: &'a str,
}

pub struct NegotiationOutcome {
    pub bundles: Vec<BundleChoice>,
    pub cache_key: String,
    pub log: Vec<String>,
}

struct Combo {
    transport: Transport,
    stay: Stay,
    activities: Vec<Activity>,
    breakdown: MoneyBreakdown,
    cost_score: u8,
    experience_score: u8,
    convenience_score: u8,
    final_score: f64,
}

fn combo_signature(c: &Combo) -> (String, String, usize) {
    (c.transport.id.clone(), c.stay.id.clone(), c.activities.len())
}

pub fn effective_budget(budget: u64, what_if_delta: i64) -> f64 {
    ((budget as i64 + what_if_delta).max(0)) as f64
}

pub fn generate_bundles(input: &NegotiationInput) -> NegotiationOutcome {
    let mut log = Vec::new();
    let key = cache_key(
        input.budget,
        input.destination,
        input.start_date,
        input.end_date,
        input.transports.len(),
        input.stays.len(),
        input.activities.len(),
        input.what_if_delta,
        input.interests,
        input.num_travelers,
    );

    // Step 1: normalize / demo-pool substitution.
    let mut all_transport: Vec<Transport> = input
        .transports
        .iter()
        .chain(input.ground_transport.iter())
        .cloned()
        .collect();
    if all_transport.is_empty() {
        log.push("no transport candidates supplied, substituting demo pool".to_string());
        all_transport = demo_transport();
    }
    let mut stays: Vec<Stay> = input.stays.to_vec();
    if stays.is_empty() {
        log.push("no stay candidates supplied, substituting demo pool".to_string());
        stays = demo_stays();
    }
    let mut activities: Vec<Activity> = input.activities.to_vec();
    if activities.is_empty() {
        log.push("no activity candidates supplied, substituting demo pool".to_string());
        activities = demo_activities();
    }

    // Step 2: top-K preselection.
    let transport_pool = top_k_by_price_and_rating(&all_transport, |t| t.total_price, |t| t.rating);
    let stay_pool = top_k_by_price_and_rating(&stays, |s| s.total_price, |s| s.star_rating);
    let interests_lower: HashSet<String> = input.interests.iter().map(|i| i.to_lowercase()).collect();
    let activity_pool = top_activities(&activities, &interests_lower);

    let transport_product: Vec<Transport> = transport_pool.into_iter().take(PRODUCT_CAP).collect();
    let stay_product: Vec<Stay> = stay_pool.into_iter().take(PRODUCT_CAP).collect();

    // Step 3: combinatorial scoring.
    let effective_b = effective_budget(input.budget, input.what_if_delta);
    let mut combos = Vec::new();
    for transport in &transport_product {
        for stay in &stay_product {
            for &size in &ACTIVITY_SUBSET_SIZES {
                let subset: Vec<Activity> = activity_pool.iter().take(size).cloned().collect();
                let breakdown = build_breakdown(transport, stay, &subset, input.duration_days, input.num_travelers);
                let c_score = cost_score(breakdown.total, effective_b);
                let e_score = experience_score(transport, stay, &subset, &interests_lower);
                let v_score = convenience_score(transport, stay, &subset, input.duration_days);
                let weights = wayfare_types::ScoringWeights::default();
                let final_score = weights.compute(e_score as f64, c_score as f64, v_score as f64);
                combos.push(Combo {
                    transport: transport.clone(),
                    stay: stay.clone(),
                    activities: subset,
                    breakdown,
                    cost_score: c_score,
                    experience_score: e_score,
                    convenience_score: v_score,
                    final_score,
                });
            }
        }
    }

    if combos.is_empty() {
        log.push("no combos could be formed from the candidate pools".to_string());
        return NegotiationOutcome {
            bundles: vec![],
            cache_key: key,
            log,
        };
    }

    // Step 4: winner selection, with dedup/tie-break across buckets.
    let mut budget_saver_pool: Vec<usize> = (0..combos.len()).collect();
    budget_saver_pool.sort_by(|&a, &b| combos[a].breakdown.total.partial_cmp(&combos[b].breakdown.total).unwrap());

    let under_budget: Vec<usize> = (0..combos.len())
        .filter(|&i| combos[i].breakdown.total <= effective_b)
        .collect();
    let mut best_value_pool = if under_budget.is_empty() {
        (0..combos.len()).collect::<Vec<_>>()
    } else {
        under_budget
    };
    best_value_pool.sort_by(|&a, &b| combos[b].final_score.partial_cmp(&combos[a].final_score).unwrap());

    let exp_budget = effective_b * 1.10;
    let exp_candidates: Vec<usize> = (0..combos.len())
        .filter(|&i| combos[i].breakdown.total <= exp_budget)
        .collect();
    let mut exp_pool = if exp_candidates.is_empty() {
        (0..combos.len()).collect::<Vec<_>>()
    } else {
        exp_candidates
    };
    exp_pool.sort_by(|&a, &b| combos[b].experience_score.cmp(&combos[a].experience_score));

    let mut used_signatures: HashSet<(String, String, usize)> = HashSet::new();

    let budget_saver_idx = pick_unique(&budget_saver_pool, &combos, &mut used_signatures);
    let best_value_idx = pick_unique(&best_value_pool, &combos, &mut used_signatures);
    let experience_idx = pick_unique(&exp_pool, &combos, &mut used_signatures);

    let mut bundles = Vec::new();
    bundles.push(build_bundle_choice(
        wayfare_types::BundleType::BudgetSaver,
        &combos[budget_saver_idx],
        &transport_product,
        &stay_product,
    ));
    bundles.push(build_bundle_choice(
        wayfare_types::BundleType::BestValue,
        &combos[best_value_idx],
        &transport_product,
        &stay_product,
    ));
    bundles.push(build_bundle_choice(
        wayfare_types::BundleType::ExperienceMax,
        &combos[experience_idx],
        &transport_product,
        &stay_product,
    ));

    // Step 6: feasibility validation + auto-repair, never aborts.
    for bundle in &mut bundles {
        let result = validate_and_repair(bundle, input.duration_days);
        if !result.passed {
            log.extend(result.issues.clone());
        }
    }

    log.push(format!("generated {} bundles from {} combos", bundles.len(), combos.len()));

    NegotiationOutcome {
        bundles,
        cache_key: key,
        log,
    }
}

fn pick_unique(
    pool: &[usize],
    combos: &[Combo],
    used: &mut HashSet<(String, String, usize)>,
) -> usize {
    for &idx in pool {
        let sig = combo_signature(&combos[idx]);
        if !used.contains(&sig) {
            used.insert(sig);
            return idx;
        }
    }
    // Every candidate collided (tiny pool); accept the top of the pool
    // rather than panic - spec property 7 is a best-effort guarantee,
    // not achievable when fewer than 3 distinct combos exist at all.
    let idx = pool[0];
    used.insert(combo_signature(&combos[idx]));
    idx
}

fn top_k_by_price_and_rating<T: Clone>(
    items: &[T],
    price: impl Fn(&T) -> f64,
    rating: impl Fn(&T) -> f64,
) -> Vec<T>
where
    T: HasId,
{
    let mut by_price: Vec<&T> = items.iter().collect();
    by_price.sort_by(|a, b| price(a).partial_cmp(&price(b)).unwrap());
    let mut by_rating: Vec<&T> = items.iter().collect();
    by_rating.sort_by(|a, b| rating(b).partial_cmp(&rating(a)).unwrap());

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in by_price.into_iter().take(K_TOP).chain(by_rating.into_iter().take(K_TOP)) {
        if seen.insert(item.id_key().to_string()) {
            out.push(item.clone());
        }
    }
    out
}

fn top_activities(items: &[Activity], interests: &HashSet<String>) -> Vec<Activity> {
    let mut sorted: Vec<Activity> = items.to_vec();
    sorted.sort_by(|a, b| {
        let bonus_a = if interests.contains(&a.category.to_lowercase()) { 2.0 } else { 0.0 };
        let bonus_b = if interests.contains(&b.category.to_lowercase()) { 2.0 } else { 0.0 };
        let score_a = a.rating + bonus_a;
        let score_b = b.rating + bonus_b;
        score_b
            .partial_cmp(&score_a)
            .unwrap()
            .then_with(|| a.price.partial_cmp(&b.price).unwrap())
    });
    sorted.into_iter().take(K_ACTIVITIES).collect()
}

trait HasId {
    fn id_key(&self) -> &str;
}

impl HasId for Transport {
    fn id_key(&self) -> &str {
        &self.id
    }
}

impl HasId for Stay {
    fn id_key(&self) -> &str {
        &self.id
    }
}

fn build_bundle_choice(
    bundle_type: wayfare_types::BundleType,
    combo: &Combo,
    transport_pool: &[Transport],
    stay_pool: &[Stay],
) -> BundleChoice {
    let mut booking_links: HashMap<String, Option<String>> = HashMap::new();
    booking_links.insert("transport".to_string(), combo.transport.booking_url.clone());
    booking_links.insert("stay".to_string(), combo.stay.booking_url.clone());
    for (i, _) in combo.activities.iter().enumerate() {
        booking_links.insert(format!("activity_{i}"), None);
    }

    let rejected = build_rejected(combo, transport_pool, stay_pool);
    let tradeoffs = build_tradeoffs(bundle_type, combo, transport_pool, stay_pool);
    let decision_log = build_decision_log(bundle_type, combo);

    BundleChoice {
        id: bundle_type.id().to_string(),
        title: bundle_type.title().to_string(),
        summary: bundle_type.summary().to_string(),
        transport: combo.transport.clone(),
        stay: combo.stay.clone(),
        activities: combo.activities.clone(),
        breakdown: combo.breakdown.clone(),
        experience_score: combo.experience_score,
        cost_score: combo.cost_score,
        convenience_score: combo.convenience_score,
        final_score: combo.final_score,
        tradeoffs,
        rejected,
        booking_links,
        decision_log,
    }
}

fn build_rejected(combo: &Combo, transport_pool: &[Transport], stay_pool: &[Stay]) -> Vec<RejectedOption> {
    let mut rejected = Vec::new();
    if let Some(alt) = transport_pool.iter().find(|t| t.id != combo.transport.id) {
        rejected.push(RejectedOption {
            name: alt.name.clone(),
            reason: if alt.total_price > combo.transport.total_price {
                "more expensive for a comparable journey".to_string()
            } else {
                "lower comfort rating than the chosen option".to_string()
            },
        });
    }
    if let Some(alt) = stay_pool.iter().find(|s| s.id != combo.stay.id) {
        rejected.push(RejectedOption {
            name: alt.name.clone(),
            reason: if alt.star_rating < combo.stay.star_rating {
                "fewer stars than the chosen stay".to_string()
            } else {
                "pricier per night than the chosen stay".to_string()
            },
        });
    }
    rejected
}

fn build_tradeoffs(
    bundle_type: wayfare_types::BundleType,
    combo: &Combo,
    transport_pool: &[Transport],
    stay_pool: &[Stay],
) -> Vec<TradeOffLine> {
    let mut lines = Vec::new();

    if let Some(alt) = transport_pool.iter().find(|t| t.id != combo.transport.id) {
        lines.push(TradeOffLine {
            gain: format!("{} costs less per head than {}", combo.transport.name, alt.name),
            sacrifice: format!("{} takes {} minutes", combo.transport.name, combo.transport.duration_minutes),
        });
    }
    if let Some(alt) = stay_pool.iter().find(|s| s.id != combo.stay.id) {
        lines.push(TradeOffLine {
            gain: format!("{} fits the budget better than {}", combo.stay.name, alt.name),
            sacrifice: format!("{} star rating", combo.stay.star_rating),
        });
    }
    lines.push(TradeOffLine {
        gain: format!("{} curated activities keep the days full", combo.activities.len()),
        sacrifice: "less free time for spontaneous exploring".to_string(),
    });

    let closing = match bundle_type {
        wayfare_types::BundleType::BudgetSaver => TradeOffLine {
            gain: "lowest total spend of the three bundles".to_string(),
            sacrifice: "fewer premium touches than Experience Max".to_string(),
        },
        wayfare_types::BundleType::BestValue => TradeOffLine {
            gain: "best balance of cost, experience, and convenience".to_string(),
            sacrifice: "not the cheapest, not the richest".to_string(),
        },
        wayfare_types::BundleType::ExperienceMax => TradeOffLine {
            gain: "richest experience, even slightly over budget".to_string(),
            sacrifice: "up to 10% over the stated budget".to_string(),
        },
    };
    lines.push(closing);
    lines
}

fn build_decision_log(bundle_type: wayfare_types::BundleType, combo: &Combo) -> Vec<String> {
    vec![
        format!("selected bundle: {}", bundle_type.title()),
        format!("transport: {} ({:.0} INR)", combo.transport.name, combo.transport.total_price),
        format!("stay: {} ({:.1} stars)", combo.stay.name, combo.stay.star_rating),
        format!("activities: {} selected", combo.activities.len()),
        format!(
            "scores: cost={} experience={} convenience={} final={:.2}",
            combo.cost_score, combo.experience_score, combo.convenience_score, combo.final_score
        ),
        format!("total cost: {:.0} INR", combo.breakdown.total),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(budget: u64, what_if_delta: i64) -> NegotiationInput<'static> {
        NegotiationInput {
            transports: &[],
            ground_transport: &[],
            stays: &[],
            activities: &[],
            budget,
            duration_days: 4,
            num_travelers: 1,
            interests: &[],
            what_if_delta,
            destination: "Rishikesh",
            start_date: "2026-09-01",
            end_date: "2026-09-05",
        }
    }

    #[test]
    fn produces_exactly_three_bundles_with_fixed_ids() {
        let outcome = generate_bundles(&input(15000, 0));
        assert_eq!(outcome.bundles.len(), 3);
        let ids: HashSet<&str> = outcome.bundles.iter().map(|b| b.id.as_str()).collect();
        assert!(ids.contains("budget_saver"));
        assert!(ids.contains("best_value"));
        assert!(ids.contains("experience_max"));
    }

    #[test]
    fn budget_saver_total_is_minimal() {
        let outcome = generate_bundles(&input(15000, 0));
        let saver = outcome.bundles.iter().find(|b| b.id == "budget_saver").unwrap();
        let best_value = outcome.bundles.iter().find(|b| b.id == "best_value").unwrap();
        assert!(saver.breakdown.total <= best_value.breakdown.total + 1e-6);
    }

    #[test]
    fn experience_max_scores_at_least_best_value() {
        let outcome = generate_bundles(&input(15000, 0));
        let exp = outcome.bundles.iter().find(|b| b.id == "experience_max").unwrap();
        let best_value = outcome.bundles.iter().find(|b| b.id == "best_value").unwrap();
        assert!(exp.experience_score >= best_value.experience_score);
    }

    #[test]
    fn bundles_are_pairwise_distinct() {
        let outcome = generate_bundles(&input(15000, 0));
        let mut sigs = HashSet::new();
        for b in &outcome.bundles {
            let sig = (b.transport.id.clone(), b.stay.id.clone(), b.activities.len());
            assert!(sigs.insert(sig), "bundles must have distinct (transport,stay,activity_count) signatures");
        }
    }

    #[test]
    fn increasing_budget_does_not_increase_budget_saver_total() {
        let low = generate_bundles(&input(8000, 0));
        let high = generate_bundles(&input(20000, 0));
        let low_saver = low.bundles.iter().find(|b| b.id == "budget_saver").unwrap();
        let high_saver = high.bundles.iter().find(|b| b.id == "budget_saver").unwrap();
        assert!(high_saver.breakdown.total <= low_saver.breakdown.total + 1e-6);
    }

    #[test]
    fn what_if_increase_keeps_experience_max_within_110_percent() {
        let outcome = generate_bundles(&input(10000, 5000));
        let best_value = outcome.bundles.iter().find(|b| b.id == "best_value").unwrap();
        assert!(best_value.breakdown.total / 15000.0 <= 1.10 + 1e-6);
    }
}
