//! Reference price abstraction and the per-row price calculations

use crate::core::page::{CellColor, ResultCell};
use anyhow::Result;
use async_trait::async_trait;

pub const UNAVAILABLE_TEXT: &str = "N/A";
pub const ERROR_TEXT: &str = "Error";

#[async_trait]
pub trait PriceFetcher: Send + Sync {
    /// Fetches the reference-region price of an item in minor units (cents).
    ///
    /// `Ok(None)` means the item has no price in that region.
    async fn fetch_reference_price(&self, item_id: &str) -> Result<Option<u64>>;
}

/// What a single row fetch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Reference price converted into the active currency.
    Converted(f64),
    Unavailable,
    Failed(String),
}

pub fn minor_to_major(minor: u64) -> f64 {
    minor as f64 / 100.0
}

pub fn convert(price: f64, rate: f64) -> f64 {
    price * rate
}

/// Parses a displayed price the way a browser's `parseFloat` would after
/// stripping everything but digits and dots: `"$1,234.50"` is `1234.5`.
pub fn parse_price(text: &str) -> Option<f64> {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    // Longest prefix with at most one decimal point
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in stripped.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        }
        end = i + 1;
    }

    let candidate = &stripped[..end];
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let candidate = candidate.trim_end_matches('.');
    let candidate = if candidate.starts_with('.') {
        format!("0{candidate}")
    } else {
        candidate.to_string()
    };
    candidate.parse().ok()
}

/// Comparison price expressed as a percentage of the converted price.
///
/// The orientation (comparison over converted) is what readers of the
/// column are used to and must not be inverted.
pub fn percentage(comparison: f64, converted: f64) -> f64 {
    comparison / converted * 100.0
}

/// Two-decimal rendering. Non-finite values read `Infinity`, `-Infinity`
/// and `NaN`, so a zero reference price shows as `0.00 (Infinity%)`.
fn to_fixed(value: f64) -> String {
    if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.2}")
    }
}

pub fn render_result(converted: f64, comparison: f64) -> ResultCell {
    let pct = percentage(comparison, converted);
    let color = if converted > comparison {
        CellColor::Green
    } else {
        CellColor::Red
    };
    ResultCell {
        text: format!("{} ({}%)", to_fixed(converted), to_fixed(pct)),
        color: Some(color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_is_multiplication() {
        for rate in [0.14, 1.0, 20.5, 185.87] {
            assert_eq!(convert(9.99, rate), 9.99 * rate);
        }
        assert_eq!(minor_to_major(999), 9.99);
        assert_eq!(minor_to_major(0), 0.0);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$2.00"), Some(2.0));
        assert_eq!(parse_price("¥ 1,234.50"), Some(1234.5));
        assert_eq!(parse_price("12,99€"), Some(1299.0));
        assert_eq!(parse_price("1.2.3"), Some(1.2));
        assert_eq!(parse_price(".5"), Some(0.5));
        assert_eq!(parse_price("7."), Some(7.0));
        assert_eq!(parse_price("Free"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("..."), None);
    }

    #[test]
    fn test_end_to_end_example() {
        let converted = convert(minor_to_major(999), 0.14);
        assert!((converted - 1.3986).abs() < 1e-9);

        let comparison = parse_price("$2.00").unwrap();
        let cell = render_result(converted, comparison);
        assert_eq!(cell.text, "1.40 (143.00%)");
        assert_eq!(cell.color, Some(CellColor::Red));
    }

    #[test]
    fn test_zero_reference_price() {
        let cell = render_result(convert(minor_to_major(0), 0.14), 2.0);
        assert_eq!(cell.text, "0.00 (Infinity%)");
        assert_eq!(cell.color, Some(CellColor::Red));

        let cell = render_result(0.0, 0.0);
        assert_eq!(cell.text, "0.00 (NaN%)");
    }

    #[test]
    fn test_color_is_green_only_when_converted_is_higher() {
        let cell = render_result(3.0, 2.0);
        assert_eq!(cell.text, "3.00 (66.67%)");
        assert_eq!(cell.color, Some(CellColor::Green));

        let cell = render_result(2.0, 2.0);
        assert_eq!(cell.text, "2.00 (100.00%)");
        assert_eq!(cell.color, Some(CellColor::Red));

        let cell = render_result(1.0, 2.0);
        assert_eq!(cell.color, Some(CellColor::Red));
    }

    #[test]
    fn test_percentage_orientation() {
        assert_eq!(percentage(150.0, 100.0), 150.0);
        assert_eq!(percentage(50.0, 100.0), 50.0);
    }
}
