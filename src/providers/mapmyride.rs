// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! MapMyRide provider implementation.
//!
//! MapMyRide has no public API for workout history, so this talks to the
//! endpoints its own web dashboard uses, authenticated with the session
//! `auth-token` cookie:
//!
//! - `GET /workouts/dashboard.json?year=Y&month=M` lists a month of workouts
//! - `GET /vxproxy/v7.0/workout/<id>/?field_set=time_series` returns timestamps
//!   and time series
//! - `GET /workout/<id>` renders the workout page, the only place elevation
//!   gain is published
//!
//! Any failure aborts the whole fetch; nothing is retried.

use super::elevation::parse_gain;
use super::time_series::decode_time_series;
use super::{TokenSource, WorkoutProvider};
use crate::constants::mapmyride::{
    AUTH_COOKIE, BASE_URL, DASHBOARD_PATH, LISTING_DATE_FORMAT, TIME_SERIES_FIELD_SET,
    USER_AGENT, VIEW_URL_ID_SEGMENT, WORKOUT_API_PATH, WORKOUT_PAGE_PATH,
};
use crate::date_range::{MonthBucket, SyncRange};
use crate::errors::{ProviderError, ProviderResult};
use crate::logging::AppLogger;
use crate::models::{Workout, WorkoutDetail, WorkoutSummary};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{COOKIE, USER_AGENT as USER_AGENT_HEADER};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

pub struct MapMyRideProvider {
    client: Client,
    token_source: Arc<dyn TokenSource>,
    base_url: String,
}

impl MapMyRideProvider {
    pub fn new(token_source: impl TokenSource + 'static) -> Self {
        Self::with_base_url(token_source, BASE_URL)
    }

    /// Point the provider at another host, e.g. a mock server in tests
    pub fn with_base_url(token_source: impl TokenSource + 'static, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token_source: Arc::new(token_source),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List one month's workouts that fall on dates inside `range`
    ///
    /// The dashboard sometimes returns entries from the neighbouring months;
    /// those are dropped here. Only dates are compared, the precise start
    /// instant is not known until the workout is enriched.
    pub async fn month_summaries(
        &self,
        bucket: MonthBucket,
        range: &SyncRange,
    ) -> ProviderResult<Vec<WorkoutSummary>> {
        let query = [
            ("year", bucket.year.to_string()),
            ("month", bucket.month.to_string()),
        ];
        let listing: DashboardResponse = self.get_json(DASHBOARD_PATH, &query).await?;

        let mut summaries = Vec::new();
        for entry in listing.workout_data.workouts.into_values().flatten() {
            let date = NaiveDate::parse_from_str(&entry.date, LISTING_DATE_FORMAT)
                .map_err(|_| ProviderError::InvalidDate(entry.date.clone()))?;

            if !bucket.contains(date) {
                debug!(month = %bucket, date = %date, "Skipping entry from neighbouring month");
                continue;
            }
            if !range.contains_date(date) {
                continue;
            }

            summaries.push(entry.into_summary(date)?);
        }

        Ok(summaries)
    }

    /// Fetch detail data and elevation gain concurrently and merge them into `summary`
    ///
    /// Both requests run inside one `try_join!`: the first failure drops the
    /// other request and is returned.
    pub async fn enrich(&self, summary: WorkoutSummary) -> ProviderResult<Workout> {
        let (detail, gain) = tokio::try_join!(
            self.fetch_detail(summary.id),
            self.fetch_gain(summary.id)
        )?;

        Ok(Workout::from_parts(summary, detail, gain))
    }

    async fn fetch_detail(&self, workout_id: i64) -> ProviderResult<WorkoutDetail> {
        let path = format!("{WORKOUT_API_PATH}{workout_id}/");
        let query = [("field_set", TIME_SERIES_FIELD_SET.to_string())];
        let response: WorkoutDetailResponse = self.get_json(&path, &query).await?;

        Ok(WorkoutDetail {
            created_at: response.created_datetime,
            started_at: response.start_datetime,
            updated_at: response.updated_datetime,
            time_series: decode_time_series(response.time_series.unwrap_or_default())?,
        })
    }

    async fn fetch_gain(&self, workout_id: i64) -> ProviderResult<i64> {
        let path = format!("{WORKOUT_PAGE_PATH}{workout_id}");
        let page = self.get_text(&path, &[]).await?;
        parse_gain(workout_id, &page)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let body = self.get_text(path, query).await?;
        serde_json::from_str(&body).map_err(|source| ProviderError::Decode {
            path: path.to_string(),
            source,
        })
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> ProviderResult<String> {
        let mut url = Url::parse(&self.base_url)?.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let token = self.token_source.token()?;
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .header(USER_AGENT_HEADER, USER_AGENT)
            .header(COOKIE, format!("{AUTH_COOKIE}={}", token.token))
            .send()
            .await?;

        let status = response.status();
        AppLogger::log_api_request(
            "GET",
            path,
            status.as_u16(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl WorkoutProvider for MapMyRideProvider {
    /// Workouts started within `range`, inclusive, sorted by start instant
    ///
    /// Months are fetched one after another. Within a month each surviving
    /// listing entry is enriched, then checked against the exact instant range
    /// since the listing only carries dates.
    async fn get_workouts(&self, range: SyncRange) -> ProviderResult<Vec<Workout>> {
        let mut workouts = Vec::new();

        for bucket in range.months() {
            let summaries = self.month_summaries(bucket, &range).await?;
            info!(month = %bucket, candidates = summaries.len(), "Listed workouts");

            for summary in summaries {
                let workout = self.enrich(summary).await?;
                if !range.contains(workout.started_at) {
                    debug!(
                        workout.id = workout.id,
                        started_at = %workout.started_at,
                        "Workout started outside range"
                    );
                    continue;
                }
                workouts.push(workout);
            }
        }

        workouts.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        Ok(workouts)
    }

    fn provider_name(&self) -> &'static str {
        "MapMyRide"
    }
}

/// A listing count that is either a number or a blank string
///
/// The dashboard reports `steps` and `time` as integers when known and as
/// `""` when not.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum CountOrBlank {
    Count(i64),
    Fraction(f64),
    Text(String),
    #[default]
    Blank,
}

impl CountOrBlank {
    /// The integral count, if one was reported
    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Count(count) => Some(*count),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Fraction(_) | Self::Blank => None,
        }
    }
}

/// Extract the workout id from a view URL such as `/workout/123`
pub fn workout_id_from_view_url(view_url: &str) -> ProviderResult<i64> {
    view_url
        .split('/')
        .nth(VIEW_URL_ID_SEGMENT)
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| ProviderError::InvalidViewUrl(view_url.to_string()))
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    workout_data: DashboardWorkoutData,
}

#[derive(Debug, Deserialize)]
struct DashboardWorkoutData {
    /// Keyed by date string
    #[serde(default)]
    workouts: BTreeMap<String, Vec<DashboardEntry>>,
}

#[derive(Debug, Deserialize)]
struct DashboardEntry {
    #[serde(default)]
    name: String,
    date: String,
    #[serde(default)]
    activity_short_name: String,
    /// Kilometers
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    energy: i64,
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    steps: CountOrBlank,
    /// Seconds
    #[serde(default)]
    time: CountOrBlank,
    view_url: String,
}

impl DashboardEntry {
    fn into_summary(self, date: NaiveDate) -> ProviderResult<WorkoutSummary> {
        let id = workout_id_from_view_url(&self.view_url)?;
        let duration = self
            .time
            .value()
            .and_then(|secs| u64::try_from(secs).ok())
            .map(Duration::from_secs)
            .unwrap_or_default();

        Ok(WorkoutSummary {
            id,
            name: self.name,
            kind: self.activity_short_name,
            kcal: self.energy,
            distance_meters: self.distance * 1000.0,
            speed_mps: self.speed,
            duration,
            step_count: self.steps.value().unwrap_or_default(),
            date,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WorkoutDetailResponse {
    created_datetime: DateTime<Utc>,
    start_datetime: DateTime<Utc>,
    updated_datetime: DateTime<Utc>,
    #[serde(default)]
    time_series: Option<BTreeMap<String, Value>>,
}
