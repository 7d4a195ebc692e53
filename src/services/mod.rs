// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod bins;
pub mod directions;
pub mod reset;

pub use bins::{BinRepository, BinSubscription};
pub use directions::{DirectionsService, RoutePlan};
pub use reset::ResetService;
