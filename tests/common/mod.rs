// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Shared fixtures: a mock MapMyRide site built on mockito

#![allow(dead_code)]

use chrono::{DateTime, Datelike, Utc};
use mapmyride_sync::date_range::SyncRange;
use mapmyride_sync::models::{
    Workout, WorkoutDistance, WorkoutPosition, WorkoutSpeed, WorkoutStep, WorkoutTimeSeries,
};
use mapmyride_sync::providers::mapmyride::MapMyRideProvider;
use mapmyride_sync::providers::StaticTokenSource;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub const TOKEN: &str = "secret";

/// How the gain section of a workout page is rendered
#[derive(Debug, Clone)]
pub enum GainPage {
    /// No elevation table at all
    Absent,
    /// Elevation table with the given label and cell text
    Row { label: String, value: String },
}

/// A workout as the mock site serves it
#[derive(Debug, Clone)]
pub struct TestWorkout {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub kcal: i64,
    pub distance_meters: f64,
    pub speed_mps: f64,
    pub step_count: i64,
    pub duration_secs: u64,
    pub gain: GainPage,
    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// (elapsed ms, meters)
    pub distances: Vec<(u64, f64)>,
    /// (elapsed ms, elevation, lat, lng)
    pub positions: Vec<(u64, f64, f64, f64)>,
    /// (elapsed ms, m/s)
    pub speeds: Vec<(u64, f64)>,
    /// (elapsed ms, steps in period)
    pub steps: Vec<(u64, f64)>,
    /// Overrides the listing's view URL
    pub view_url: Option<String>,
    /// Overrides the listing date
    pub listing_date: Option<String>,
}

impl TestWorkout {
    pub fn new(id: i64, name: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: "ride".to_string(),
            kcal: 0,
            distance_meters: 0.0,
            speed_mps: 0.0,
            step_count: 0,
            duration_secs: 0,
            gain: GainPage::Absent,
            started_at,
            created_at: started_at,
            updated_at: started_at,
            distances: Vec::new(),
            positions: Vec::new(),
            speeds: Vec::new(),
            steps: Vec::new(),
            view_url: None,
            listing_date: None,
        }
    }

    pub fn with_gain(mut self, label: &str, value: &str) -> Self {
        self.gain = GainPage::Row {
            label: label.to_string(),
            value: value.to_string(),
        };
        self
    }

    /// The workout the provider is expected to produce
    pub fn to_workout(&self) -> Workout {
        let gain_meters = match &self.gain {
            GainPage::Row { value, .. } => value.trim().parse().unwrap_or(0),
            GainPage::Absent => 0,
        };

        Workout {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind.clone(),
            kcal: self.kcal,
            distance_meters: self.distance_meters,
            speed_mps: self.speed_mps,
            duration: Duration::from_secs(self.duration_secs),
            step_count: self.step_count,
            gain_meters,
            started_at: self.started_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            time_series: WorkoutTimeSeries {
                distances: self
                    .distances
                    .iter()
                    .map(|&(ms, total_meters)| WorkoutDistance {
                        elapsed: Duration::from_millis(ms),
                        total_meters,
                    })
                    .collect(),
                positions: self
                    .positions
                    .iter()
                    .map(|&(ms, elevation, lat, lng)| WorkoutPosition {
                        elapsed: Duration::from_millis(ms),
                        elevation,
                        lat,
                        lng,
                    })
                    .collect(),
                speeds: self
                    .speeds
                    .iter()
                    .map(|&(ms, meters_per_second)| WorkoutSpeed {
                        elapsed: Duration::from_millis(ms),
                        meters_per_second,
                    })
                    .collect(),
                steps: self
                    .steps
                    .iter()
                    .map(|&(ms, steps_in_period)| WorkoutStep {
                        elapsed: Duration::from_millis(ms),
                        steps_in_period,
                    })
                    .collect(),
            },
        }
    }

    fn listing_entry(&self) -> Value {
        let blank_or = |n: i64| if n > 0 { json!(n) } else { json!("") };

        json!({
            "name": self.name,
            "date": self
                .listing_date
                .clone()
                .unwrap_or_else(|| self.started_at.format("%m/%d/%Y").to_string()),
            "activity_short_name": self.kind,
            "distance": self.distance_meters / 1000.0,
            "energy": self.kcal,
            "speed": self.speed_mps,
            "steps": blank_or(self.step_count),
            "time": blank_or(i64::try_from(self.duration_secs).unwrap()),
            "view_url": self
                .view_url
                .clone()
                .unwrap_or_else(|| format!("/workout/{}", self.id)),
        })
    }

    pub fn detail_body(&self) -> Value {
        let secs = |ms: u64| ms as f64 / 1000.0;
        let mut series = Map::new();

        if !self.distances.is_empty() {
            let pairs: Vec<Value> = self.distances.iter().map(|&(ms, v)| json!([secs(ms), v])).collect();
            series.insert("distance".to_string(), json!(pairs));
        }
        if !self.positions.is_empty() {
            let pairs: Vec<Value> = self
                .positions
                .iter()
                .map(|&(ms, elevation, lat, lng)| {
                    json!([secs(ms), {"elevation": elevation, "lat": lat, "lng": lng}])
                })
                .collect();
            series.insert("position".to_string(), json!(pairs));
        }
        if !self.speeds.is_empty() {
            let pairs: Vec<Value> = self.speeds.iter().map(|&(ms, v)| json!([secs(ms), v])).collect();
            series.insert("speed".to_string(), json!(pairs));
        }
        if !self.steps.is_empty() {
            let pairs: Vec<Value> = self.steps.iter().map(|&(ms, v)| json!([secs(ms), v])).collect();
            series.insert("steps".to_string(), json!(pairs));
        }

        let time_series = if series.is_empty() {
            Value::Null
        } else {
            Value::Object(series)
        };

        json!({
            "created_datetime": self.created_at.to_rfc3339(),
            "start_datetime": self.started_at.to_rfc3339(),
            "updated_datetime": self.updated_at.to_rfc3339(),
            "time_series": time_series,
        })
    }

    pub fn page_body(&self) -> String {
        match &self.gain {
            GainPage::Absent => "<p>hello</p>".to_string(),
            GainPage::Row { label, value } => elevation_page(label, value),
        }
    }
}

pub fn elevation_page(label: &str, value: &str) -> String {
    format!(
        r#"
<table id="workout_elevation_data" class="mmf_workout_table">
    <thead>
        <tr>
            <th colspan="2" scope="col">Elevation</th>
        </tr>
    </thead>
    <tbody>
        <tr>
            <th scope="row">{label}</th>
            <td>
                <span class="notranslate">   {value}      <!-- ensure space trimming --></span>
                <span class="unit">m</span>
            </td>
        </tr>
        <tr>
            <th scope="row">Max</th>
            <td>
                <span class="notranslate">61</span>
                <span class="unit">m</span>
            </td>
        </tr>
    </tbody>
</table>"#
    )
}

pub fn provider_for(server: &ServerGuard) -> MapMyRideProvider {
    MapMyRideProvider::with_base_url(StaticTokenSource::new(TOKEN), server.url())
}

pub fn month_query(year: i32, month: u32) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("year".into(), year.to_string()),
        Matcher::UrlEncoded("month".into(), month.to_string()),
    ])
}

/// Serve a dashboard listing for `(year, month)` with the given entries
pub async fn mock_listing(
    server: &mut ServerGuard,
    year: i32,
    month: u32,
    workouts: &[&TestWorkout],
) -> Mock {
    let mut by_date: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for workout in workouts {
        by_date
            .entry(workout.started_at.format("%Y-%m-%d").to_string())
            .or_default()
            .push(workout.listing_entry());
    }

    server
        .mock("GET", "/workouts/dashboard.json")
        .match_query(month_query(year, month))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"workout_data": {"workouts": by_date}}).to_string())
        .create_async()
        .await
}

/// Serve the detail API and workout page for one workout
pub async fn mock_workout(server: &mut ServerGuard, workout: &TestWorkout) -> (Mock, Mock) {
    let detail = server
        .mock("GET", format!("/vxproxy/v7.0/workout/{}/", workout.id).as_str())
        .match_query(Matcher::UrlEncoded("field_set".into(), "time_series".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(workout.detail_body().to_string())
        .create_async()
        .await;

    let page = server
        .mock("GET", format!("/workout/{}", workout.id).as_str())
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(workout.page_body())
        .create_async()
        .await;

    (detail, page)
}

/// Serve every month of `range` and every workout in `workouts`
///
/// Listings are grouped by each workout's start month, as the real site does.
pub async fn serve(server: &mut ServerGuard, range: &SyncRange, workouts: &[TestWorkout]) -> Vec<Mock> {
    let mut mocks = Vec::new();

    for bucket in range.months() {
        let in_month: Vec<&TestWorkout> = workouts
            .iter()
            .filter(|w| w.started_at.year() == bucket.year && w.started_at.month() == bucket.month)
            .collect();
        mocks.push(mock_listing(server, bucket.year, bucket.month, &in_month).await);
    }

    for workout in workouts {
        let (detail, page) = mock_workout(server, workout).await;
        mocks.push(detail);
        mocks.push(page);
    }

    mocks
}
