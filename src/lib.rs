// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # MapMyRide Sync
//!
//! Retrieves workout history from MapMyRide for a date range and reconciles
//! it into a local SQLite database, attributed to a named local user.
//!
//! ## Features
//!
//! - **Month-windowed fetching**: the range is split into calendar months,
//!   each listed from the provider's dashboard
//! - **Concurrent enrichment**: per-workout detail and elevation gain are
//!   fetched together
//! - **Time series**: distance, position, speed and step samples keyed by
//!   elapsed time
//! - **Idempotent reconciliation**: workouts are replaced wholesale and
//!   workouts that vanished from the provider are removed
//!
//! ## Architecture
//!
//! - **Providers**: the [`providers::WorkoutProvider`] seam and the MapMyRide client
//! - **Models**: workouts and their samples
//! - **Database**: SQLite storage with per-workout atomic upserts
//! - **Sync**: the fetch, upsert, remove-extra run
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mapmyride_sync::database::Database;
//! use mapmyride_sync::date_range::SyncRange;
//! use mapmyride_sync::providers::mapmyride::MapMyRideProvider;
//! use mapmyride_sync::providers::StaticTokenSource;
//! use mapmyride_sync::sync::sync_range;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = MapMyRideProvider::new(StaticTokenSource::new("auth-token-value"));
//!     let db = Database::new("sqlite:data.db").await?;
//!
//!     let end = chrono::Utc::now();
//!     let range = SyncRange::new(end - chrono::Duration::days(30), end);
//!     let report = sync_range(&provider, &db, "dan", range).await?;
//!     println!("synced {} workouts", report.upserted);
//!
//!     Ok(())
//! }
//! ```

/// Workout provider implementations
pub mod providers;

/// Common data models for workouts and samples
pub mod models;

/// Sync ranges and calendar month buckets
pub mod date_range;

/// Provider error types
pub mod errors;

/// Configuration for a sync run
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Workout storage
pub mod database;

/// Reconciliation of storage against the provider
pub mod sync;

/// Logging and structured output
pub mod logging;
