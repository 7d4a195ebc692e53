// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod bin;
pub mod history;
pub mod stats;

pub use bin::{Bin, Position};
pub use history::HistoricalEntry;
pub use stats::{CollectionReceipt, LeaderboardEntry, ResetState};
