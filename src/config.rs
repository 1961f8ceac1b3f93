// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration for a sync run, from command line values and environment

use crate::constants::{env_config, sync};
use crate::date_range::SyncRange;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// SQLite database file, created if missing
    pub database_file: PathBuf,
    /// Local user the synced workouts are attributed to
    pub user_name: String,
    /// Provider session token
    pub auth_token: String,
    pub base_url: String,
    /// First day to sync; defaults to a look-back from the latest stored workout
    pub begin_day: Option<NaiveDate>,
    /// Last day to sync, inclusive; defaults to now
    pub end_day: Option<NaiveDate>,
}

impl SyncConfig {
    /// Combine command line values with the token and base URL from the environment
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env(
        database_file: PathBuf,
        user_name: String,
        begin_day: Option<NaiveDate>,
        end_day: Option<NaiveDate>,
    ) -> Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            info!("No .env file loaded: {}", e);
        }

        let auth_token = env_config::auth_token().ok_or_else(|| {
            anyhow!(
                "{} is not set. Log in to https://www.mapmyride.com/ and use the value of the auth-token cookie",
                env_config::AUTH_TOKEN
            )
        })?;

        let config = Self {
            database_file,
            user_name,
            auth_token,
            base_url: env_config::base_url(),
            begin_day,
            end_day,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.user_name.trim().is_empty() {
            return Err(anyhow!("A username is required to attribute workouts to"));
        }

        if let (Some(begin), Some(end)) = (self.begin_day, self.end_day) {
            if begin > end {
                return Err(anyhow!("Begin day {begin} is after end day {end}"));
            }
        }

        if self.base_url != crate::constants::mapmyride::BASE_URL {
            warn!(base_url = %self.base_url, "Using non-default provider base URL");
        }

        Ok(())
    }

    /// Database connection target for logging
    pub fn database_display(&self) -> String {
        self.database_file.display().to_string()
    }

    /// Get a summary of the configuration for logging (without secrets)
    pub fn summary(&self) -> String {
        format!(
            "Sync configuration:\n\
             - User: {}\n\
             - Database: {}\n\
             - Provider: {}\n\
             - Begin day: {}\n\
             - End day: {}",
            self.user_name,
            self.database_display(),
            self.base_url,
            self.begin_day
                .map_or_else(|| "latest stored workout".to_string(), |d| d.to_string()),
            self.end_day
                .map_or_else(|| "now".to_string(), |d| d.to_string()),
        )
    }
}

/// Parse a `YYYY-MM-DD` day as given on the command line
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, sync::DAY_FORMAT)
        .with_context(|| format!("Invalid day {value:?}, expected YYYY-MM-DD"))
}

/// Work out the instant range to sync
///
/// - begin: start of `begin_day`, otherwise start of the day
///   [`sync::RESYNC_LOOKBACK_DAYS`] days before the latest stored workout
/// - end: end of `end_day`, otherwise `now`
///
/// With neither a begin day nor stored workouts there is nothing to anchor
/// the range on, which is an error.
pub fn resolve_range(
    begin_day: Option<NaiveDate>,
    end_day: Option<NaiveDate>,
    latest_stored: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<SyncRange> {
    let begin = match (begin_day, latest_stored) {
        (Some(day), _) => start_of_day(day),
        (None, Some(latest)) => {
            start_of_day(latest.date_naive() - Duration::days(sync::RESYNC_LOOKBACK_DAYS))
        }
        (None, None) => {
            return Err(anyhow!(
                "No stored workouts for this user; pass --begin-day for the first sync"
            ))
        }
    };

    let end = end_day.map_or(now, end_of_day);
    if begin > end {
        return Err(anyhow!(
            "Sync range begins at {} which is after its end {}",
            begin.to_rfc3339(),
            end.to_rfc3339()
        ));
    }

    Ok(SyncRange::new(begin, end))
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_day(day) + Duration::days(1) - Duration::milliseconds(1)
}
