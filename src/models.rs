// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Workouts as they are synced from MapMyRide and stored locally.
//!
//! A [`Workout`] is assembled once per sync run from two sources: the
//! monthly dashboard listing (a [`WorkoutSummary`]) and the per-workout
//! detail endpoints (timestamps, time series and elevation gain). It is
//! never mutated after that merge.
//!
//! ## Elapsed offsets
//!
//! Every sample carries an `elapsed` offset measured from the start of the
//! workout. This is *not* wall-clock time: pauses during the activity mean
//! elapsed time can fall behind the time of day. Sample sequences keep the
//! order the provider reported them in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cumulative distance at a point in the workout, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDistance {
    pub elapsed: Duration,
    pub total_meters: f64,
}

/// Position fix at a point in the workout. Elevation is in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPosition {
    pub elapsed: Duration,
    pub elevation: f64,
    pub lat: f64,
    pub lng: f64,
}

/// Instantaneous speed at a point in the workout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSpeed {
    pub elapsed: Duration,
    pub meters_per_second: f64,
}

/// Steps counted in the period ending at `elapsed`. Fractional values occur.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkoutStep {
    pub elapsed: Duration,
    pub steps_in_period: f64,
}

/// The four per-workout sample sequences, in provider order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTimeSeries {
    pub distances: Vec<WorkoutDistance>,
    pub positions: Vec<WorkoutPosition>,
    pub speeds: Vec<WorkoutSpeed>,
    pub steps: Vec<WorkoutStep>,
}

impl WorkoutTimeSeries {
    /// Total number of samples across all four series
    pub fn len(&self) -> usize {
        self.distances.len() + self.positions.len() + self.speeds.len() + self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lightweight listing entry for a workout, before enrichment
///
/// Only the calendar date is known at this point; the precise start instant
/// comes from the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    /// Provider-assigned identifier, parsed from the workout's view URL
    pub id: i64,
    pub name: String,
    /// Activity short name as reported by the provider (e.g. "ride", "walk")
    pub kind: String,
    pub kcal: i64,
    /// Meters (the listing reports kilometers)
    pub distance_meters: f64,
    pub speed_mps: f64,
    pub duration: Duration,
    pub step_count: i64,
    /// Date the workout is filed under in the listing
    pub date: NaiveDate,
}

/// Detail-level data fetched for a single workout
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDetail {
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub time_series: WorkoutTimeSeries,
}

/// A fully enriched workout
///
/// Identity is `id`; every other field may change between syncs and is
/// replaced wholesale when the workout is stored again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub kcal: i64,
    /// Total distance in meters
    pub distance_meters: f64,
    /// Average speed in meters per second
    pub speed_mps: f64,
    pub duration: Duration,
    pub step_count: i64,
    /// Elevation gain in meters, zero when the provider does not publish one
    pub gain_meters: i64,
    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub time_series: WorkoutTimeSeries,
}

impl Workout {
    /// Merge a listing summary with its detail data and elevation gain
    pub fn from_parts(summary: WorkoutSummary, detail: WorkoutDetail, gain_meters: i64) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            kind: summary.kind,
            kcal: summary.kcal,
            distance_meters: summary.distance_meters,
            speed_mps: summary.speed_mps,
            duration: summary.duration,
            step_count: summary.step_count,
            gain_meters,
            started_at: detail.started_at,
            created_at: detail.created_at,
            updated_at: detail.updated_at,
            time_series: detail.time_series,
        }
    }
}
