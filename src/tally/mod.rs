use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Poll, VoteRecord};

/// Per-candidate outcome. `ratio` is the bar width relative to the
/// front-runner, 0.0 when nobody has voted yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTally {
    pub place_id: String,
    pub count: usize,
    pub voters: Vec<String>,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyResult {
    pub max_count: usize,
    pub tallies: Vec<CandidateTally>,
}

/// Count the votes for a poll. Every candidate gets a tally even with zero
/// votes, tallies follow the poll's candidate order, voters follow the order
/// the records were handed in, and selections naming unknown candidates are
/// skipped. Pure function of its inputs.
pub fn tally(poll: &Poll, votes: &[VoteRecord]) -> TallyResult {
    let mut voters_by_candidate: HashMap<&str, Vec<String>> = HashMap::new();
    for candidate in &poll.candidates {
        voters_by_candidate.entry(candidate.id.as_str()).or_default();
    }

    for record in votes {
        for selection in &record.selections {
            if let Some(voters) = voters_by_candidate.get_mut(selection.as_str()) {
                voters.push(record.voter_name.clone());
            }
        }
    }

    let max_count = voters_by_candidate
        .values()
        .map(|voters| voters.len())
        .max()
        .unwrap_or(0);

    let tallies = poll
        .candidates
        .iter()
        .map(|candidate| {
            let voters = voters_by_candidate
                .remove(candidate.id.as_str())
                .unwrap_or_default();
            let count = voters.len();
            let ratio = if max_count == 0 {
                0.0
            } else {
                count as f64 / max_count as f64
            };
            CandidateTally {
                place_id: candidate.id.clone(),
                count,
                voters,
                ratio,
            }
        })
        .collect();

    TallyResult { max_count, tallies }
}
