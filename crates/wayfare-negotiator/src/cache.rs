//! Negotiator-local cache key. Ported from `_cache_key`, with the
//! resolved open question: `interests` and `num_travelers` are included
//! in the key (see DESIGN.md) so a re-run with the same distance/budget
//! but different interests never hits a stale bundle set.

use md5::{Digest, Md5};

#[allow(clippy::too_many_arguments)]
pub fn cache_key(
    budget: u64,
    destination: &str,
    start_date: &str,
    end_date: &str,
    n_flights: usize,
    n_hotels: usize,
    n_activities: usize,
    what_if_delta: i64,
    interests: &[String],
    num_travelers: u32,
) -> String {
    let mut sorted_interests: Vec<String> = interests.iter().map(|s| s.to_lowercase()).collect();
    sorted_interests.sort();

    let parts = vec![
        budget.to_string(),
        destination.to_lowercase(),
        start_date.to_string(),
        end_date.to_string(),
        n_flights.to_string(),
        n_hotels.to_string(),
        n_activities.to_string(),
        what_if_delta.to_string(),
        sorted_interests.join(","),
        num_travelers.to_string(),
    ];
    let joined = parts.join("|");

    let mut hasher = Md5::new();
    hasher.update(joined.as_bytes());
    let digest = hasher.finalize();
    format!("{digest:x}")[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_key() {
        let a = cache_key(10000, "Rishikesh", "2026-09-01", "2026-09-04", 2, 2, 5, 0, &["adventure".into()], 1);
        let b = cache_key(10000, "Rishikesh", "2026-09-01", "2026-09-04", 2, 2, 5, 0, &["adventure".into()], 1);
        assert_eq!(a, b);
    }

    #[test]
    fn different_interests_change_key() {
        let a = cache_key(10000, "Rishikesh", "2026-09-01", "2026-09-04", 2, 2, 5, 0, &["adventure".into()], 1);
        let b = cache_key(10000, "Rishikesh", "2026-09-01", "2026-09-04", 2, 2, 5, 0, &["spiritual".into()], 1);
        assert_ne!(a, b);
    }

    #[test]
    fn different_what_if_delta_changes_key() {
        let a = cache_key(10000, "Rishikesh", "2026-09-01", "2026-09-04", 2, 2, 5, 0, &[], 1);
        let b = cache_key(10000, "Rishikesh", "2026-09-01", "2026-09-04", 2, 2, 5, 5000, &[], 1);
        assert_ne!(a, b);
    }
}
