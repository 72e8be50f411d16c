use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Poll ids are truncated digests; 10 hex chars keeps share links short and
/// is plenty for the handful of polls a group ever creates.
pub const POLL_ID_LEN: usize = 10;

/// A restaurant candidate as returned by the search provider, normalized.
/// Immutable once fetched; a poll stores a snapshot of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_address: Option<String>,
    pub url: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    /// Stable id for provider records that carry none: sha256 over
    /// name + address, full lowercase hex. The same listing fetched twice
    /// hashes to the same id.
    pub fn derive_id(name: &str, address: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(address.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: String,
    pub candidates: Vec<Place>,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    pub fn contains_candidate(&self, place_id: &str) -> bool {
        self.candidates.iter().any(|c| c.id == place_id)
    }
}

/// One voter's latest submission for a poll. Keyed by (poll_id, voter_name);
/// resubmitting replaces the previous record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub poll_id: String,
    pub voter_name: String,
    pub selections: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Deterministic poll id: sha256 over the JSON encoding of the
/// lexicographically sorted candidate ids, truncated to [`POLL_ID_LEN`] hex
/// chars. The ids are framed as a JSON array so distinct sets never share a
/// digest input, whatever characters the ids contain. Creating a poll from
/// the same set of places in any order yields the same id.
pub fn poll_id_for(candidates: &[Place]) -> Result<String, AppError> {
    let mut ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(&ids)?.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    Ok(hex[..POLL_ID_LEN].to_string())
}

/// Selections form a set; drop duplicates while keeping first-seen order.
pub fn normalize_selections(selections: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(selections.len());
    for s in selections {
        if !seen.contains(&s) {
            seen.push(s);
        }
    }
    seen
}
