// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Decoding of the per-workout `time_series` block.
//!
//! Each series is a JSON array of `[elapsed_seconds, value]` pairs:
//!
//! | series     | value                                   |
//! |------------|-----------------------------------------|
//! | `distance` | cumulative meters                       |
//! | `speed`    | meters per second                       |
//! | `steps`    | steps in the period (may be fractional) |
//! | `position` | `{"elevation", "lat", "lng"}` object    |
//!
//! Elapsed seconds are fractional and are truncated to whole milliseconds.
//! A pair of the wrong arity or element type fails the whole decode.

use crate::errors::{ProviderError, ProviderResult};
use crate::models::{
    WorkoutDistance, WorkoutPosition, WorkoutSpeed, WorkoutStep, WorkoutTimeSeries,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// One decoded series
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSeries {
    Distance(Vec<WorkoutDistance>),
    Position(Vec<WorkoutPosition>),
    Speed(Vec<WorkoutSpeed>),
    Steps(Vec<WorkoutStep>),
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    #[serde(default)]
    elevation: f64,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lng: f64,
}

/// Convert fractional elapsed seconds to a duration, floored to the millisecond
pub fn elapsed_from_seconds(seconds: f64) -> Duration {
    // float-to-int `as` saturates: negatives and NaN become zero
    Duration::from_millis((seconds * 1000.0) as u64)
}

/// Decode a single named series. Unknown names yield `Ok(None)`.
pub fn decode_series(name: &str, payload: Value) -> ProviderResult<Option<TimeSeries>> {
    let series = match name {
        "distance" => TimeSeries::Distance(
            pairs::<f64>(name, payload)?
                .into_iter()
                .map(|(elapsed, total_meters)| WorkoutDistance {
                    elapsed: elapsed_from_seconds(elapsed),
                    total_meters,
                })
                .collect(),
        ),
        "position" => TimeSeries::Position(
            pairs::<RawPosition>(name, payload)?
                .into_iter()
                .map(|(elapsed, pos)| WorkoutPosition {
                    elapsed: elapsed_from_seconds(elapsed),
                    elevation: pos.elevation,
                    lat: pos.lat,
                    lng: pos.lng,
                })
                .collect(),
        ),
        "speed" => TimeSeries::Speed(
            pairs::<f64>(name, payload)?
                .into_iter()
                .map(|(elapsed, meters_per_second)| WorkoutSpeed {
                    elapsed: elapsed_from_seconds(elapsed),
                    meters_per_second,
                })
                .collect(),
        ),
        "steps" => TimeSeries::Steps(
            pairs::<f64>(name, payload)?
                .into_iter()
                .map(|(elapsed, steps_in_period)| WorkoutStep {
                    elapsed: elapsed_from_seconds(elapsed),
                    steps_in_period,
                })
                .collect(),
        ),
        other => {
            debug!(series = %other, "Ignoring unknown time series");
            return Ok(None);
        }
    };

    Ok(Some(series))
}

/// Decode every recognised series in a `time_series` block
pub fn decode_time_series(raw: BTreeMap<String, Value>) -> ProviderResult<WorkoutTimeSeries> {
    let mut out = WorkoutTimeSeries::default();

    for (name, payload) in raw {
        match decode_series(&name, payload)? {
            Some(TimeSeries::Distance(v)) => out.distances = v,
            Some(TimeSeries::Position(v)) => out.positions = v,
            Some(TimeSeries::Speed(v)) => out.speeds = v,
            Some(TimeSeries::Steps(v)) => out.steps = v,
            None => {}
        }
    }

    Ok(out)
}

fn pairs<T: DeserializeOwned>(name: &str, payload: Value) -> ProviderResult<Vec<(f64, T)>> {
    serde_json::from_value(payload).map_err(|source| ProviderError::TimeSeries {
        series: name.to_string(),
        source,
    })
}
