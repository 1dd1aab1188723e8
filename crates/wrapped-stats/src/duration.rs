//! ISO-8601 duration parsing.

use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").ok());

/// Converts a `PT#H#M#S` duration to hours.
///
/// Empty or non-matching input yields `0.0`. Fractional or negative
/// components do not match.
pub fn parse_duration_hours(duration: &str) -> f64 {
    let Some(re) = DURATION_RE.as_ref() else {
        return 0.0;
    };
    let Some(caps) = re.captures(duration) else {
        return 0.0;
    };
    let component = |idx: usize| {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    component(1) + component(2) / 60.0 + component(3) / 3600.0
}
