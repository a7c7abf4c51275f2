//! Stable content-derived identifiers.
//!
//! Candidates arriving from providers or demo pools don't always carry a
//! natural id; the negotiator needs one anyway for dedup and for the
//! cache key. `stable_id` ports `_stable_id` from the negotiator's
//! source: an 8-character prefix of the MD5 hex digest of the input.

use md5::{Digest, Md5};

pub fn stable_id(seed: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    let hex = format!("{digest:x}");
    hex[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        assert_eq!(stable_id("IndiGo Express"), stable_id("IndiGo Express"));
    }

    #[test]
    fn stable_id_is_eight_chars() {
        assert_eq!(stable_id("anything").len(), 8);
    }

    #[test]
    fn stable_id_differs_by_seed() {
        assert_ne!(stable_id("a"), stable_id("b"));
    }
}
