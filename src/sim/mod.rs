//! Deterministic fake-vote generation for demos and seeded test data.
//! Generated votes go wherever the caller sends them; nothing here touches
//! stored polls or tallies on its own.

use crate::models::Poll;

const LCG_MODULUS: u64 = 233280;

/// Small LCG, deterministic across runs for a given seed.
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    // State stays below the modulus, so the update never overflows
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % LCG_MODULUS,
        }
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * 9301 + 49297) % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }
}

/// Derive a seed from an identifying string, typically the poll id, so the
/// same poll always gets the same simulated crowd.
pub fn seed_from_key(key: &str) -> u64 {
    key.chars().map(|c| c as u64).sum()
}

/// Have each named voter pick one candidate at random. Returns
/// `(voter_name, selections)` pairs ready for vote submission.
pub fn simulate_votes(poll: &Poll, voter_names: &[&str], seed: u64) -> Vec<(String, Vec<String>)> {
    if poll.candidates.is_empty() {
        return Vec::new();
    }

    let mut rng = SeededRng::new(seed);
    voter_names
        .iter()
        .map(|name| {
            let index = (rng.next_f64() * poll.candidates.len() as f64) as usize;
            let pick = poll.candidates[index].id.clone();
            (name.to_string(), vec![pick])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{poll_id_for, Place};
    use chrono::Utc;

    fn poll(candidate_ids: &[&str]) -> Poll {
        let candidates: Vec<Place> = candidate_ids
            .iter()
            .map(|id| Place {
                id: id.to_string(),
                name: format!("place {id}"),
                address: format!("{id} street"),
                road_address: None,
                url: String::new(),
                latitude: 0.0,
                longitude: 0.0,
            })
            .collect();
        Poll {
            id: poll_id_for(&candidates).unwrap(),
            candidates,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn lcg_follows_the_known_recurrence() {
        let mut rng = SeededRng::new(42);
        // (42 * 9301 + 49297) % 233280 = 206659
        assert_eq!(rng.next_f64(), 206659.0 / 233280.0);
        // (206659 * 9301 + 49297) % 233280 = 190736
        assert_eq!(rng.next_f64(), 190736.0 / 233280.0);
    }

    #[test]
    fn seed_is_the_sum_of_char_codes() {
        assert_eq!(seed_from_key(""), 0);
        assert_eq!(seed_from_key("ab"), 195);
    }

    #[test]
    fn huge_seeds_are_folded_into_range() {
        let mut rng = SeededRng::new(u64::MAX);
        let value = rng.next_f64();
        assert!((0.0..1.0).contains(&value));

        // Seeding with the reduced state yields the same sequence
        let mut reduced = SeededRng::new(u64::MAX % LCG_MODULUS);
        assert_eq!(value, reduced.next_f64());
    }

    #[test]
    fn same_seed_produces_the_same_crowd() {
        let poll = poll(&["a", "b", "c"]);
        let voters = ["kim", "lee", "park"];

        let first = simulate_votes(&poll, &voters, seed_from_key(&poll.id));
        let second = simulate_votes(&poll, &voters, seed_from_key(&poll.id));
        assert_eq!(first, second);
    }

    #[test]
    fn every_simulated_voter_picks_one_real_candidate() {
        let poll = poll(&["a", "b", "c"]);
        let voters = ["kim", "lee", "park", "choi"];

        for (name, selections) in simulate_votes(&poll, &voters, 7) {
            assert!(voters.contains(&name.as_str()));
            assert_eq!(selections.len(), 1);
            assert!(poll.contains_candidate(&selections[0]));
        }
    }

    #[test]
    fn a_poll_without_candidates_yields_no_votes() {
        let empty = Poll {
            id: String::new(),
            candidates: Vec::new(),
            created_at: Utc::now(),
        };
        assert!(simulate_votes(&empty, &["kim"], 1).is_empty());
    }
}
