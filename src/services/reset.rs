// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly reset of the cumulative collected-weight counters.
//!
//! The counters feed the weekly leaderboard, so they restart every week:
//! the first run on a Monday zeroes every bin's `collected_weight` and
//! stamps the date in `app_state`. Comparison is by calendar date, so
//! repeated runs on the same Monday reset at most once. The trigger fires
//! on Mondays only; a week with no Monday run is left as-is.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::ResetState;
use crate::time_utils::{format_date, parse_date};
use chrono::{Datelike, NaiveDate, Weekday};

/// Whether the weekly reset should run today.
pub fn reset_due(today: NaiveDate, last_reset: Option<NaiveDate>) -> bool {
    if today.weekday() != Weekday::Mon {
        return false;
    }
    match last_reset {
        Some(date) => date != today,
        None => true,
    }
}

/// Applies the weekly reset against the store.
#[derive(Clone)]
pub struct ResetService {
    db: FirestoreDb,
}

impl ResetService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Run the reset if it is due today. Returns whether it ran.
    pub async fn run_if_due(&self, today: NaiveDate) -> Result<bool, AppError> {
        let last_reset = self
            .db
            .get_reset_state()
            .await?
            .and_then(|state| parse_date(&state.last_reset_date));

        if !reset_due(today, last_reset) {
            return Ok(false);
        }

        let count = self.db.reset_all_collected().await?;
        self.db
            .set_reset_state(&ResetState {
                last_reset_date: format_date(today),
            })
            .await?;

        tracing::info!(bins = count, date = %today, "Weekly collected-weight reset applied");
        Ok(true)
    }
}
