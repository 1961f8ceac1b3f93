// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors raised while fetching workouts from the provider.
//!
//! None of these are recovered from locally: any of them aborts the whole
//! fetch and no partial result is returned.

/// Provider fetch errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {path}")]
    Status { status: u16, path: String },

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed {series} time series: {source}")]
    TimeSeries {
        series: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Converting {0:?} to date failed")]
    InvalidDate(String),

    #[error("Converting {0:?} to workout id failed")]
    InvalidViewUrl(String),

    #[error("Unable to detect gain for workout {workout_id}: row labelled {label:?}")]
    GainLabel { workout_id: i64, label: String },

    #[error("Invalid gain value {value:?} for workout {workout_id}")]
    GainValue { workout_id: i64, value: String },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Token unavailable: {0}")]
    Token(String),

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type ProviderResult<T> = Result<T, ProviderError>;
