// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Smart bin model for storage and API.

use serde::{Deserialize, Serialize};

/// Full-scale reading of the fill-distance sensor in centimeters.
/// A reading at this distance means the bin is empty; 0 means full.
const FULL_SCALE_DISTANCE_CM: f64 = 100.0;

/// Geographic position as consumed by the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Live state of a single smart bin, stored in the `bins` collection.
///
/// Sensors own every field except `collected_weight` and `closed`: the
/// service only ever increments the former and toggles the latter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    /// Bin identifier, e.g. "Tong FIK" (also used as document ID)
    pub id: String,
    /// Battery level percent (0-100)
    pub battery: f64,
    /// Fill sensor distance to the waste surface (cm)
    pub distance: f64,
    /// Current load on the scale (kg)
    pub weight: f64,
    /// Cumulative weight collected since the last weekly reset (kg)
    #[serde(default)]
    pub collected_weight: f64,
    /// Whether the lid is currently closed
    #[serde(default)]
    pub closed: bool,
    /// Where the bin stands
    pub position: Position,
}

impl Bin {
    /// How full the bin is, as a percentage derived from the fill-distance
    /// sensor. Readings outside the sensor's range clamp to [0, 100].
    pub fn fill_percent(&self) -> f64 {
        ((FULL_SCALE_DISTANCE_CM - self.distance) / FULL_SCALE_DISTANCE_CM * 100.0)
            .clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin_with_distance(distance: f64) -> Bin {
        Bin {
            id: "Tong FIK".to_string(),
            battery: 88.0,
            distance,
            weight: 4.2,
            collected_weight: 0.0,
            closed: false,
            position: Position {
                latitude: -6.3628,
                longitude: 106.8269,
            },
        }
    }

    #[test]
    fn test_fill_percent_midway() {
        assert_eq!(bin_with_distance(75.0).fill_percent(), 25.0);
        assert_eq!(bin_with_distance(20.0).fill_percent(), 80.0);
    }

    #[test]
    fn test_fill_percent_clamps_out_of_range_readings() {
        // Sensor noise can report past the physical limits.
        assert_eq!(bin_with_distance(140.0).fill_percent(), 0.0);
        assert_eq!(bin_with_distance(-3.0).fill_percent(), 100.0);
    }

    #[test]
    fn test_fill_percent_extremes() {
        assert_eq!(bin_with_distance(100.0).fill_percent(), 0.0);
        assert_eq!(bin_with_distance(0.0).fill_percent(), 100.0);
    }
}
