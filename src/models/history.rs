// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily collection history records.

use serde::{Deserialize, Serialize};

/// One day's total collected weight across all bins.
///
/// Append-only: written once when a field worker finishes their day,
/// never mutated or deleted. Keyed by an opaque generated identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEntry {
    /// Opaque document ID
    pub id: String,
    /// Calendar date of the collection day (YYYY-MM-DD)
    pub date: String,
    /// Total weight collected across all bins that day (kg)
    pub total_weight: f64,
    /// When the entry was recorded (ISO 8601)
    pub recorded_at: String,
}

impl HistoricalEntry {
    /// Build a new entry with a generated identifier.
    pub fn new(date: String, total_weight: f64, recorded_at: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            total_weight,
            recorded_at,
        }
    }
}
