// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # MapMyRide Sync Binary
//!
//! Syncs a user's MapMyRide workouts into a local SQLite database.
//!
//! ```bash
//! AUTH_TOKEN=... mapmyride-sync --username dan --begin-day 2020-01-01
//! ```
//!
//! Without `--begin-day` the run starts 14 days before the latest workout
//! already stored for the user, so recent edits on the provider are picked up.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use mapmyride_sync::{
    config::{parse_day, resolve_range, SyncConfig},
    constants::sync::DEFAULT_DATABASE_FILE,
    database::Database,
    logging::{LogFormat, LoggingConfig},
    providers::{mapmyride::MapMyRideProvider, StaticTokenSource},
    sync::sync_range,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mapmyride-sync")]
#[command(about = "Sync MapMyRide workouts into a local SQLite database")]
pub struct Args {
    /// Database file path
    #[arg(long, default_value = DEFAULT_DATABASE_FILE)]
    database_file: PathBuf,

    /// Username to attribute workouts to
    #[arg(long)]
    username: String,

    /// First day to sync, in YYYY-MM-DD format
    #[arg(long, value_parser = parse_day_arg)]
    begin_day: Option<NaiveDate>,

    /// Last day to sync, in YYYY-MM-DD format (inclusive)
    #[arg(long, value_parser = parse_day_arg)]
    end_day: Option<NaiveDate>,

    /// Log output format: json, pretty or compact
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn parse_day_arg(value: &str) -> Result<NaiveDate, String> {
    parse_day(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::from_env();
    if let Some(format) = args.log_format {
        logging = logging.with_format(format);
    }
    logging.init()?;

    if let Err(e) = run(args).await {
        error!("Sync failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = SyncConfig::from_env(
        args.database_file,
        args.username,
        args.begin_day,
        args.end_day,
    )?;
    info!("{}", config.summary());

    let db = Database::open_file(&config.database_file).await?;
    info!("Database initialized successfully");

    let latest = db.latest_started_at(&config.user_name).await?;
    let range = resolve_range(config.begin_day, config.end_day, latest, Utc::now())?;
    info!(user.name = %config.user_name, sync.range = %range, "Resolved sync range");

    let provider = MapMyRideProvider::with_base_url(
        StaticTokenSource::new(config.auth_token.clone()),
        config.base_url.clone(),
    );

    let report = sync_range(&provider, &db, &config.user_name, range).await?;
    info!(
        "Synced {} workouts ({} fetched, {} removed)",
        report.upserted, report.fetched, report.removed
    );

    Ok(())
}
