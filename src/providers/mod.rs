// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::date_range::SyncRange;
use crate::errors::{ProviderError, ProviderResult};
use crate::models::Workout;
use async_trait::async_trait;

pub mod elevation;
pub mod mapmyride;
pub mod time_series;

/// Source of workouts for a sync run
#[async_trait]
pub trait WorkoutProvider: Send + Sync {
    /// Workouts whose start instant lies in `range`, sorted by start instant
    async fn get_workouts(&self, range: SyncRange) -> ProviderResult<Vec<Workout>>;

    fn provider_name(&self) -> &'static str;
}

/// Session token presented to the provider
///
/// May grow an expiry once rotating tokens are supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token: String,
}

/// Supplies the current session token
pub trait TokenSource: Send + Sync {
    fn token(&self) -> ProviderResult<Token>;
}

/// A [`TokenSource`] that always returns the same token
#[derive(Debug, Clone)]
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticTokenSource {
    fn token(&self) -> ProviderResult<Token> {
        if self.0.trim().is_empty() {
            return Err(ProviderError::Token("session token is empty".to_string()));
        }
        Ok(Token {
            token: self.0.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_token_source() {
        let source = StaticTokenSource::new("secret");
        assert_eq!(source.token().unwrap().token, "secret");
        assert_eq!(source.token().unwrap().token, "secret");
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let source = StaticTokenSource::new("  ");
        assert!(matches!(source.token(), Err(ProviderError::Token(_))));
    }
}
