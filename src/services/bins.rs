// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bin repository: the single access path to bin state.
//!
//! Screens used to talk to the store directly, each with its own ad-hoc
//! listener. This repository replaces that with typed operations plus an
//! explicit subscription: a polling watcher that invokes a callback with
//! only the bins whose snapshot changed, and a handle to stop delivery.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Bin, CollectionReceipt};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// How often the watcher polls the store for snapshot changes.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Typed access to bin state, shared across handlers and background tasks.
#[derive(Clone)]
pub struct BinRepository {
    db: FirestoreDb,
    poll_interval: Duration,
    latest: Arc<DashMap<String, Bin>>,
}

impl BinRepository {
    pub fn new(db: FirestoreDb) -> Self {
        Self::with_poll_interval(db, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(db: FirestoreDb, poll_interval: Duration) -> Self {
        Self {
            db,
            poll_interval,
            latest: Arc::new(DashMap::new()),
        }
    }

    /// List all bins, ordered by identifier.
    pub async fn list_bins(&self) -> Result<Vec<Bin>, AppError> {
        self.db.list_bins().await
    }

    /// Get one bin by identifier.
    pub async fn get_bin(&self, bin_id: &str) -> Result<Option<Bin>, AppError> {
        self.db.get_bin(bin_id).await
    }

    /// Credit a collection against a bin, given the post-collection scale
    /// reading. Fails with [`AppError::NoWasteCollected`] when the reading
    /// is not below the bin's current weight; nothing is committed then.
    pub async fn empty_bin(
        &self,
        bin_id: &str,
        final_weight: f64,
    ) -> Result<CollectionReceipt, AppError> {
        self.db.empty_bin_atomic(bin_id, final_weight).await
    }

    /// Flip a bin's lid state. Returns the new state.
    pub async fn toggle_lid(&self, bin_id: &str) -> Result<bool, AppError> {
        self.db.toggle_lid_atomic(bin_id).await
    }

    /// Sum of cumulative collected weight across all bins.
    pub async fn total_collected(&self) -> Result<f64, AppError> {
        let bins = self.list_bins().await?;
        Ok(bins.iter().map(|b| b.collected_weight).sum())
    }

    /// Subscribe to bin snapshot changes.
    ///
    /// The callback receives only the bins that changed since the previous
    /// poll (new bins included). Delivery continues until the returned
    /// handle's [`BinSubscription::unsubscribe`] is called.
    pub fn subscribe_to_bins<F>(&self, callback: F) -> BinSubscription
    where
        F: Fn(&[Bin]) + Send + Sync + 'static,
    {
        let db = self.db.clone();
        let latest = Arc::clone(&self.latest);
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                match db.list_bins().await {
                    Ok(bins) => {
                        let changed = changed_bins(&latest, &bins);
                        if changed.is_empty() {
                            continue;
                        }
                        for bin in &changed {
                            latest.insert(bin.id.clone(), bin.clone());
                        }
                        callback(&changed);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Bin snapshot poll failed");
                    }
                }
            }
        });

        BinSubscription { task }
    }
}

/// Handle for an active bin subscription.
pub struct BinSubscription {
    task: tokio::task::JoinHandle<()>,
}

impl BinSubscription {
    /// Stop delivery. No callback runs after this returns.
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Bins whose snapshot differs from the cached state, input order kept.
fn changed_bins(latest: &DashMap<String, Bin>, current: &[Bin]) -> Vec<Bin> {
    current
        .iter()
        .filter(|bin| {
            latest
                .get(&bin.id)
                .map_or(true, |cached| *cached != **bin)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn bin(id: &str, weight: f64) -> Bin {
        Bin {
            id: id.to_string(),
            battery: 90.0,
            distance: 40.0,
            weight,
            collected_weight: 0.0,
            closed: false,
            position: Position {
                latitude: -6.3628,
                longitude: 106.8269,
            },
        }
    }

    #[test]
    fn test_changed_bins_reports_everything_on_first_poll() {
        let latest = DashMap::new();
        let current = vec![bin("Tong FIK", 1.0), bin("Tong FT", 2.0)];

        let changed = changed_bins(&latest, &current);

        assert_eq!(changed.len(), 2);
        assert_eq!(changed[0].id, "Tong FIK");
    }

    #[test]
    fn test_changed_bins_empty_when_snapshots_match() {
        let latest = DashMap::new();
        latest.insert("Tong FIK".to_string(), bin("Tong FIK", 1.0));

        let changed = changed_bins(&latest, &[bin("Tong FIK", 1.0)]);

        assert!(changed.is_empty());
    }

    #[test]
    fn test_changed_bins_reports_only_the_changed_one() {
        let latest = DashMap::new();
        latest.insert("Tong FIK".to_string(), bin("Tong FIK", 1.0));
        latest.insert("Tong FT".to_string(), bin("Tong FT", 2.0));

        let current = vec![bin("Tong FIK", 1.0), bin("Tong FT", 5.5)];
        let changed = changed_bins(&latest, &current);

        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].id, "Tong FT");
        assert_eq!(changed[0].weight, 5.5);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_the_watcher() {
        // Offline mock: polls fail, but the task lifecycle is what matters.
        let repo = BinRepository::with_poll_interval(
            FirestoreDb::new_mock(),
            Duration::from_millis(5),
        );

        let subscription = repo.subscribe_to_bins(|_| {});
        assert!(subscription.is_active());

        subscription.unsubscribe();
    }
}
