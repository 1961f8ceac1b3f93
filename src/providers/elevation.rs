// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Elevation gain scraped from the rendered workout page.
//!
//! The API does not expose gain, so it is read from the first row of the
//! page's elevation table. Some workout kinds have no elevation table at
//! all; that is a normal zero-gain outcome.

use crate::constants::mapmyride::{ELEVATION_ROW_SELECTOR, GAIN_LABEL};
use crate::errors::{ProviderError, ProviderResult};
use scraper::{ElementRef, Html, Selector};

/// Extract the elevation gain in meters from a workout page
///
/// - no elevation row: `0`
/// - row present but not labelled "Gain": error
/// - blank or `--` value: `0`
/// - non-numeric value: error
pub fn parse_gain(workout_id: i64, html: &str) -> ProviderResult<i64> {
    let row_selector = selector(ELEVATION_ROW_SELECTOR)?;
    let label_selector = selector("th")?;
    let value_selector = selector("td > span")?;

    let document = Html::parse_document(html);
    let Some(row) = document.select(&row_selector).next() else {
        return Ok(0);
    };

    let label = row
        .select(&label_selector)
        .next()
        .map(text_of)
        .unwrap_or_default();
    if label.trim() != GAIN_LABEL {
        return Err(ProviderError::GainLabel {
            workout_id,
            label,
        });
    }

    let value = row
        .select(&value_selector)
        .next()
        .map(text_of)
        .unwrap_or_default();
    let value = value.trim();
    if value.is_empty() || value == "--" {
        return Ok(0);
    }

    value.parse().map_err(|_| ProviderError::GainValue {
        workout_id,
        value: value.to_string(),
    })
}

fn selector(css: &str) -> ProviderResult<Selector> {
    Selector::parse(css).map_err(|e| ProviderError::Selector(e.to_string()))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elevation_page(label: &str, value: &str) -> String {
        format!(
            r#"<html><body>
<table id="workout_elevation_data" class="mmf_workout_table">
    <thead>
        <tr><th colspan="2" scope="col">Elevation</th></tr>
    </thead>
    <tbody>
        <tr>
            <th scope="row">{label}</th>
            <td>
                <span class="notranslate">   {value}      <!-- trailing comment --></span>
                <span class="unit">m</span>
            </td>
        </tr>
        <tr>
            <th scope="row">Start</th>
            <td><span class="notranslate">61</span><span class="unit">m</span></td>
        </tr>
    </tbody>
</table>
</body></html>"#
        )
    }

    #[test]
    fn test_parses_gain() {
        assert_eq!(parse_gain(1, &elevation_page("Gain", "10")).unwrap(), 10);
    }

    #[test]
    fn test_blank_gain_is_zero() {
        assert_eq!(parse_gain(1, &elevation_page("Gain", " ")).unwrap(), 0);
    }

    #[test]
    fn test_dashes_gain_is_zero() {
        assert_eq!(parse_gain(1, &elevation_page("Gain", "--")).unwrap(), 0);
    }

    #[test]
    fn test_missing_table_is_zero() {
        assert_eq!(parse_gain(1, "<p>hello</p>").unwrap(), 0);
    }

    #[test]
    fn test_wrong_label_is_an_error() {
        let err = parse_gain(9, &elevation_page("Loss", "10")).unwrap_err();
        assert!(matches!(err, ProviderError::GainLabel { workout_id: 9, .. }));
    }

    #[test]
    fn test_non_numeric_gain_is_an_error() {
        let err = parse_gain(3, &elevation_page("Gain", "lots")).unwrap_err();
        assert!(matches!(err, ProviderError::GainValue { ref value, .. } if value == "lots"));
    }
}
