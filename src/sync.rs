// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reconciling local storage with a fresh fetch from the provider.
//!
//! A run fetches every workout in the range, upserts them one at a time and
//! finally removes stored workouts in the range that the fetch no longer
//! returned. Each upsert commits on its own: if the run fails part way, the
//! workouts already upserted stay stored and the removal step never runs.

use crate::database::Database;
use crate::date_range::SyncRange;
use crate::logging::AppLogger;
use crate::providers::WorkoutProvider;
use anyhow::{Context, Result};
use tracing::info;

/// Outcome of a sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Workouts returned by the provider for the range
    pub fetched: usize,
    /// Workouts written to storage
    pub upserted: usize,
    /// Stored workouts removed because the provider no longer returned them
    pub removed: u64,
}

/// Make `user_name`'s stored workouts in `range` match the provider
pub async fn sync_range(
    provider: &dyn WorkoutProvider,
    db: &Database,
    user_name: &str,
    range: SyncRange,
) -> Result<SyncReport> {
    info!(
        user.name = %user_name,
        provider = provider.provider_name(),
        sync.range = %range,
        "Syncing workouts"
    );

    let workouts = provider
        .get_workouts(range)
        .await
        .with_context(|| format!("Fetching workouts from {}", provider.provider_name()))?;

    let mut report = SyncReport {
        fetched: workouts.len(),
        ..SyncReport::default()
    };

    for workout in &workouts {
        db.upsert_workout(user_name, workout)
            .await
            .with_context(|| format!("Storing workout {}", workout.id))?;

        AppLogger::log_workout_upsert(
            user_name,
            workout.id,
            &workout.started_at.to_rfc3339(),
            &workout.name,
            workout.time_series.len(),
        );
        report.upserted += 1;
    }

    report.removed = db
        .remove_extra(user_name, &range, &workouts)
        .await
        .context("Removing workouts no longer returned by the provider")?;

    info!(
        user.name = %user_name,
        sync.fetched = report.fetched,
        sync.upserted = report.upserted,
        sync.removed = report.removed,
        "Sync complete"
    );

    Ok(report)
}
