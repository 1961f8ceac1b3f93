// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants and environment-based configuration values.

/// MapMyRide endpoints and page structure
pub mod mapmyride {
    /// Production site, overridable through `MAPMYRIDE_BASE_URL`
    pub const BASE_URL: &str = "https://www.mapmyride.com";

    /// Monthly workout listing, queried with `year` and `month`
    pub const DASHBOARD_PATH: &str = "/workouts/dashboard.json";

    /// Prefix of the workout detail API; the workout id and a trailing slash follow
    pub const WORKOUT_API_PATH: &str = "/vxproxy/v7.0/workout/";

    /// Prefix of the rendered workout page
    pub const WORKOUT_PAGE_PATH: &str = "/workout/";

    /// Query value selecting the time series field set on the detail API
    pub const TIME_SERIES_FIELD_SET: &str = "time_series";

    /// Position of the workout id in a `view_url` split on `/`
    pub const VIEW_URL_ID_SEGMENT: usize = 2;

    /// Dashboard listing date format
    pub const LISTING_DATE_FORMAT: &str = "%m/%d/%Y";

    /// Cookie carrying the session token
    pub const AUTH_COOKIE: &str = "auth-token";

    /// The site serves its full pages only to browser-like agents
    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36";

    /// First row of the elevation table on the workout page
    pub const ELEVATION_ROW_SELECTOR: &str =
        "#workout_elevation_data > tbody:nth-child(2) > tr:nth-child(1)";

    /// Expected label of the elevation row
    pub const GAIN_LABEL: &str = "Gain";
}

/// Sync behaviour defaults
pub mod sync {
    /// Days before the latest stored workout to re-sync, absorbing provider-side edits
    pub const RESYNC_LOOKBACK_DAYS: i64 = 14;

    /// Day format accepted by `--begin-day` and `--end-day`
    pub const DAY_FORMAT: &str = "%Y-%m-%d";

    pub const DEFAULT_DATABASE_FILE: &str = "data.db";
}

/// Environment variable names
pub mod env_config {
    use std::env;

    pub const AUTH_TOKEN: &str = "AUTH_TOKEN";
    pub const BASE_URL: &str = "MAPMYRIDE_BASE_URL";

    /// Get the provider base URL from environment or default
    pub fn base_url() -> String {
        env::var(BASE_URL).unwrap_or_else(|_| super::mapmyride::BASE_URL.to_string())
    }

    /// Get the session token from environment, if set and non-empty
    pub fn auth_token() -> Option<String> {
        env::var(AUTH_TOKEN).ok().filter(|token| !token.is_empty())
    }
}
