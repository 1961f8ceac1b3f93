// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! Local SQLite storage for synced workouts.
//!
//! Each workout is one row in `workouts`, attributed to a local user name,
//! plus one row per sample in the four child tables. A re-synced workout
//! replaces its parent row and all child rows in a single transaction, so
//! readers never see a half-written workout.
//!
//! Timestamps are stored as fixed-width UTC text, which keeps SQL text
//! comparison in step with instant comparison.

use crate::date_range::SyncRange;
use crate::logging::AppLogger;
use crate::models::{
    Workout, WorkoutDistance, WorkoutPosition, WorkoutSpeed, WorkoutStep, WorkoutTimeSeries,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9fZ";

/// Child sample tables, each keyed by `workout_id`
const SAMPLE_TABLES: [&str; 4] = [
    "workout_steps",
    "workout_speeds",
    "workout_positions",
    "workout_distances",
];

/// A workout as read back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct StoredWorkout {
    pub user_name: String,
    pub workout: Workout,
}

/// Workout storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to a SQLite database URL such as `sqlite:data.db` or `sqlite::memory:`
    ///
    /// The database file is created if it does not exist and the schema is
    /// brought up to date.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL {database_url}"))?;
        Self::connect(options, database_url.contains(":memory:")).await
    }

    /// Open (creating if needed) a database file
    pub async fn open_file(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(path);
        Self::connect(options, false)
            .await
            .with_context(|| format!("Opening database file {}", path.display()))
    }

    async fn connect(options: SqliteConnectOptions, in_memory: bool) -> Result<Self> {
        let options = options.create_if_missing(true).foreign_keys(true);

        // Every connection to `:memory:` is a separate database, so keep exactly one alive
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options.connect_with(options).await?;
        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Create tables and indexes if they are missing
    pub async fn migrate(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY,
                user_name TEXT NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                kcal INTEGER NOT NULL,
                distance_m REAL NOT NULL,
                speed_mps REAL NOT NULL,
                duration_s INTEGER NOT NULL,
                step_count INTEGER NOT NULL,
                gain_m INTEGER NOT NULL,
                started_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS workout_distances (
                workout_id INTEGER NOT NULL REFERENCES workouts (id),
                seq INTEGER NOT NULL,
                elapsed_seconds REAL NOT NULL,
                total_meters REAL NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS workout_positions (
                workout_id INTEGER NOT NULL REFERENCES workouts (id),
                seq INTEGER NOT NULL,
                elapsed_seconds REAL NOT NULL,
                elevation REAL NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS workout_speeds (
                workout_id INTEGER NOT NULL REFERENCES workouts (id),
                seq INTEGER NOT NULL,
                elapsed_seconds REAL NOT NULL,
                meters_per_second REAL NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS workout_steps (
                workout_id INTEGER NOT NULL REFERENCES workouts (id),
                seq INTEGER NOT NULL,
                elapsed_seconds REAL NOT NULL,
                steps REAL NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_workouts_user_started ON workouts(user_name, started_at)",
            "CREATE INDEX IF NOT EXISTS idx_workout_distances_workout ON workout_distances(workout_id)",
            "CREATE INDEX IF NOT EXISTS idx_workout_positions_workout ON workout_positions(workout_id)",
            "CREATE INDEX IF NOT EXISTS idx_workout_speeds_workout ON workout_speeds(workout_id)",
            "CREATE INDEX IF NOT EXISTS idx_workout_steps_workout ON workout_steps(workout_id)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Replace a workout and all of its samples, attributed to `user_name`
    ///
    /// Existing sample rows and the parent row are deleted and the new ones
    /// inserted inside one transaction. On any failure the transaction is
    /// rolled back and the previously stored workout is left as it was.
    pub async fn upsert_workout(&self, user_name: &str, workout: &Workout) -> Result<()> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        for table in SAMPLE_TABLES {
            sqlx::query(&format!("DELETE FROM {table} WHERE workout_id = ?1"))
                .bind(workout.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM workouts WHERE id = ?1")
            .bind(workout.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO workouts (id, user_name, name, kind, kcal, distance_m, speed_mps,
                                  duration_s, step_count, gain_m, started_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(workout.id)
        .bind(user_name)
        .bind(&workout.name)
        .bind(&workout.kind)
        .bind(workout.kcal)
        .bind(workout.distance_meters)
        .bind(workout.speed_mps)
        .bind(i64::try_from(workout.duration.as_secs()).context("Workout duration out of range")?)
        .bind(workout.step_count)
        .bind(workout.gain_meters)
        .bind(format_timestamp(workout.started_at))
        .bind(format_timestamp(workout.created_at))
        .bind(format_timestamp(workout.updated_at))
        .execute(&mut *tx)
        .await?;

        let series = &workout.time_series;

        for (seq, d) in (0_i64..).zip(&series.distances) {
            sqlx::query(
                "INSERT INTO workout_distances (workout_id, seq, elapsed_seconds, total_meters) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(workout.id)
            .bind(seq)
            .bind(d.elapsed.as_secs_f64())
            .bind(d.total_meters)
            .execute(&mut *tx)
            .await?;
        }

        for (seq, p) in (0_i64..).zip(&series.positions) {
            sqlx::query(
                "INSERT INTO workout_positions (workout_id, seq, elapsed_seconds, elevation, lat, lng) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(workout.id)
            .bind(seq)
            .bind(p.elapsed.as_secs_f64())
            .bind(p.elevation)
            .bind(p.lat)
            .bind(p.lng)
            .execute(&mut *tx)
            .await?;
        }

        for (seq, s) in (0_i64..).zip(&series.speeds) {
            sqlx::query(
                "INSERT INTO workout_speeds (workout_id, seq, elapsed_seconds, meters_per_second) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(workout.id)
            .bind(seq)
            .bind(s.elapsed.as_secs_f64())
            .bind(s.meters_per_second)
            .execute(&mut *tx)
            .await?;
        }

        for (seq, s) in (0_i64..).zip(&series.steps) {
            sqlx::query(
                "INSERT INTO workout_steps (workout_id, seq, elapsed_seconds, steps) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(workout.id)
            .bind(seq)
            .bind(s.elapsed.as_secs_f64())
            .bind(s.steps_in_period)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        AppLogger::log_database_operation("upsert", "workouts", true, elapsed_ms(started));
        Ok(())
    }

    /// Delete `user_name`'s workouts started within `range` that are not in `fetched`
    ///
    /// This is how workouts deleted on the provider, or moved out of the
    /// range, disappear locally. Runs in its own transaction, separate from
    /// any upserts that preceded it. Returns the number of workouts removed.
    pub async fn remove_extra(
        &self,
        user_name: &str,
        range: &SyncRange,
        fetched: &[Workout],
    ) -> Result<u64> {
        let started = Instant::now();
        let kept_ids: Vec<i64> = fetched.iter().map(|w| w.id).collect();
        let kept_json = serde_json::to_string(&kept_ids)?;
        let begin = format_timestamp(range.begin);
        let end = format_timestamp(range.end);

        const EXTRA_WORKOUTS: &str = "SELECT id FROM workouts \
             WHERE user_name = ?1 AND started_at >= ?2 AND started_at <= ?3 \
             AND id NOT IN (SELECT value FROM json_each(?4))";

        let mut tx = self.pool.begin().await?;

        for table in SAMPLE_TABLES {
            sqlx::query(&format!(
                "DELETE FROM {table} WHERE workout_id IN ({EXTRA_WORKOUTS})"
            ))
            .bind(user_name)
            .bind(&begin)
            .bind(&end)
            .bind(&kept_json)
            .execute(&mut *tx)
            .await?;
        }

        let removed = sqlx::query(&format!(
            "DELETE FROM workouts WHERE id IN ({EXTRA_WORKOUTS})"
        ))
        .bind(user_name)
        .bind(&begin)
        .bind(&end)
        .bind(&kept_json)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        AppLogger::log_database_operation("remove_extra", "workouts", true, elapsed_ms(started));
        AppLogger::log_remove_extra(user_name, &range.to_string(), removed, &kept_ids);

        Ok(removed)
    }

    /// Latest stored start instant for `user_name`, if they have any workouts
    pub async fn latest_started_at(&self, user_name: &str) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<String> =
            sqlx::query_scalar("SELECT MAX(started_at) FROM workouts WHERE user_name = ?1")
                .bind(user_name)
                .fetch_one(&self.pool)
                .await?;

        latest.as_deref().map(parse_timestamp).transpose()
    }

    /// Ids of `user_name`'s stored workouts, in start order
    pub async fn workout_ids(&self, user_name: &str) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM workouts WHERE user_name = ?1 ORDER BY started_at, id",
        )
        .bind(user_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Read a workout back with all of its samples in their original order
    pub async fn get_workout(&self, workout_id: i64) -> Result<Option<StoredWorkout>> {
        let row = sqlx::query("SELECT * FROM workouts WHERE id = ?1")
            .bind(workout_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let time_series = self.load_time_series(workout_id).await?;
        let user_name: String = row.try_get("user_name")?;
        let workout = row_to_workout(&row, time_series)?;

        Ok(Some(StoredWorkout { user_name, workout }))
    }

    async fn load_time_series(&self, workout_id: i64) -> Result<WorkoutTimeSeries> {
        let distances = sqlx::query(
            "SELECT elapsed_seconds, total_meters FROM workout_distances WHERE workout_id = ?1 ORDER BY seq",
        )
        .bind(workout_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| {
            Ok(WorkoutDistance {
                elapsed: elapsed_from_row(row)?,
                total_meters: row.try_get("total_meters")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        let positions = sqlx::query(
            "SELECT elapsed_seconds, elevation, lat, lng FROM workout_positions WHERE workout_id = ?1 ORDER BY seq",
        )
        .bind(workout_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| {
            Ok(WorkoutPosition {
                elapsed: elapsed_from_row(row)?,
                elevation: row.try_get("elevation")?,
                lat: row.try_get("lat")?,
                lng: row.try_get("lng")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        let speeds = sqlx::query(
            "SELECT elapsed_seconds, meters_per_second FROM workout_speeds WHERE workout_id = ?1 ORDER BY seq",
        )
        .bind(workout_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| {
            Ok(WorkoutSpeed {
                elapsed: elapsed_from_row(row)?,
                meters_per_second: row.try_get("meters_per_second")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        let steps = sqlx::query(
            "SELECT elapsed_seconds, steps FROM workout_steps WHERE workout_id = ?1 ORDER BY seq",
        )
        .bind(workout_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| {
            Ok(WorkoutStep {
                elapsed: elapsed_from_row(row)?,
                steps_in_period: row.try_get("steps")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(WorkoutTimeSeries {
            distances,
            positions,
            speeds,
            steps,
        })
    }

    /// Number of sample rows stored for a workout, across all four tables
    pub async fn sample_count(&self, workout_id: i64) -> Result<i64> {
        let mut total = 0;
        for table in SAMPLE_TABLES {
            let count: i64 =
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE workout_id = ?1"))
                    .bind(workout_id)
                    .fetch_one(&self.pool)
                    .await?;
            total += count;
        }
        Ok(total)
    }
}

/// Convert a database row to a Workout
fn row_to_workout(row: &SqliteRow, time_series: WorkoutTimeSeries) -> Result<Workout> {
    let duration_s: i64 = row.try_get("duration_s")?;
    let started_at: String = row.try_get("started_at")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Workout {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kind: row.try_get("kind")?,
        kcal: row.try_get("kcal")?,
        distance_meters: row.try_get("distance_m")?,
        speed_mps: row.try_get("speed_mps")?,
        duration: Duration::from_secs(u64::try_from(duration_s).unwrap_or_default()),
        step_count: row.try_get("step_count")?,
        gain_meters: row.try_get("gain_m")?,
        started_at: parse_timestamp(&started_at)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        time_series,
    })
}

fn elapsed_from_row(row: &SqliteRow) -> Result<Duration> {
    let seconds: f64 = row.try_get("elapsed_seconds")?;
    // stored as float seconds; round back to the millisecond the sample was decoded with
    Ok(Duration::from_millis((seconds * 1000.0).round() as u64))
}

fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .with_context(|| format!("Invalid stored timestamp {value:?}"))?;
    Ok(naive.and_utc())
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
