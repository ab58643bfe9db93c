//! Geographic primitives for transitline.
//!
//! Kept as a small pure-logic crate so position math and movement
//! filtering stay reusable and independently testable away from the
//! async pipelines.

use serde::{Deserialize, Serialize};

/// Mean earth radius in meters for the spherical distance model.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic position in decimal degrees, WGS84-style axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
}

impl Position {
    /// Create a position from latitude and longitude in decimal degrees.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another position in meters.
    #[must_use]
    pub fn distance_m(&self, other: &Position) -> f64 {
        haversine_m(self, other)
    }
}

/// Great-circle distance between two positions in meters.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_M`].
/// Good to well under a meter at the scales movement filtering cares
/// about, which is all this crate needs.
#[must_use]
pub fn haversine_m(a: &Position, b: &Position) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Movement filter that suppresses positions within a distance
/// threshold of the last accepted one.
///
/// The first offered position is always accepted. After that a
/// position is accepted only when it is strictly farther than the
/// threshold from the last accepted position, and acceptance advances
/// the reference point. Rejected positions do not move the reference.
#[derive(Debug, Clone)]
pub struct DistanceFilter {
    threshold_m: f64,
    last_accepted: Option<Position>,
}

impl DistanceFilter {
    /// Create a filter with the given threshold in meters.
    #[must_use]
    pub fn new(threshold_m: f64) -> Self {
        Self {
            threshold_m,
            last_accepted: None,
        }
    }

    /// Pure acceptance predicate: a candidate passes when there is no
    /// previous position or it is strictly farther than the threshold.
    #[must_use]
    pub fn should_accept(&self, previous: Option<Position>, candidate: Position) -> bool {
        match previous {
            None => true,
            Some(reference) => haversine_m(&reference, &candidate) > self.threshold_m,
        }
    }

    /// Offer a position; returns true when it should be kept.
    pub fn accept(&mut self, position: Position) -> bool {
        if self.should_accept(self.last_accepted, position) {
            self.last_accepted = Some(position);
            true
        } else {
            false
        }
    }

    /// The last accepted position, if any.
    #[must_use]
    pub fn last_accepted(&self) -> Option<Position> {
        self.last_accepted
    }

    /// Configured threshold in meters.
    #[must_use]
    pub fn threshold_m(&self) -> f64 {
        self.threshold_m
    }

    /// Forget the reference point so the next position is accepted
    /// unconditionally.
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
