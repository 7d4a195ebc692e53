//! Collection accounting rules and derived statistics.
//!
//! These are the business rules behind the "empty bin" flow and the
//! weekly leaderboard. They are pure so the Firestore transaction code
//! and the HTTP layer can share them without any transport dependency.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How many bins the leaderboard keeps.
pub const LEADERBOARD_SIZE: usize = 3;

/// Guard result: emptying the bin removed no weight, so the cumulative
/// counter must not be updated.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("no waste collected: final weight is not below the initial weight")]
pub struct NoWasteCollected;

/// Weight removed from a bin during a collection.
///
/// `final_weight` is the scale reading after emptying. Valid only when it
/// is strictly below `initial_weight`; anything else is [`NoWasteCollected`].
pub fn weight_lifted(initial_weight: f64, final_weight: f64) -> Result<f64, NoWasteCollected> {
    let lifted = initial_weight - final_weight;
    if lifted <= 0.0 {
        return Err(NoWasteCollected);
    }
    Ok(lifted)
}

/// Add a lifted weight to the cumulative counter.
///
/// Monotonic non-decrease holds because [`weight_lifted`] already rejected
/// non-positive deltas.
pub fn apply_collection(previous_collected: f64, lifted: f64) -> f64 {
    previous_collected + lifted
}

/// Receipt for a committed collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReceipt {
    /// Bin that was emptied
    pub bin_id: String,
    /// Weight credited for this collection (kg)
    pub weight_lifted: f64,
    /// New cumulative total for the bin (kg)
    pub collected_weight: f64,
}

/// One leaderboard row: a bin and its cumulative collected weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub bin_id: String,
    pub collected_weight: f64,
}

/// Rank bins by collected weight, descending, keeping the top 3.
///
/// The sort is stable: bins with equal weights stay in input order, so
/// callers that pass a deterministic listing get deterministic output.
pub fn rank_collectors(weights: impl IntoIterator<Item = (String, f64)>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = weights
        .into_iter()
        .map(|(bin_id, collected_weight)| LeaderboardEntry {
            bin_id,
            collected_weight,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.collected_weight
            .partial_cmp(&a.collected_weight)
            .unwrap_or(Ordering::Equal)
    });
    entries.truncate(LEADERBOARD_SIZE);
    entries
}

/// Stored marker for the weekly collected-weight reset.
///
/// Lives in the `app_state` collection; comparison is by calendar date so
/// repeated runs on the same day reset at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetState {
    /// Date of the last applied reset (YYYY-MM-DD)
    pub last_reset_date: String,
}
