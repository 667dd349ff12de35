//! Candle timeframe parsing and ordering.

use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Parses a venue timeframe such as `"15m"` or `"1M"` into a duration.
///
/// Months count as 30 days and years as 365 days. Unknown suffixes and
/// malformed amounts yield a zero duration.
pub fn parse_timeframe(timeframe: &str) -> Duration {
    let timeframe = timeframe.trim();
    let Some(unit) = timeframe.chars().last() else {
        return Duration::ZERO;
    };
    let amount = &timeframe[..timeframe.len() - unit.len_utf8()];
    let Ok(amount) = amount.parse::<u64>() else {
        return Duration::ZERO;
    };

    let unit_secs = match unit {
        's' => 1,
        'm' => MINUTE,
        'h' => HOUR,
        'd' => DAY,
        'w' => 7 * DAY,
        'M' => 30 * DAY,
        'y' => 365 * DAY,
        _ => return Duration::ZERO,
    };
    Duration::from_secs(amount.saturating_mul(unit_secs))
}

/// Sorts timeframes by real duration, shortest first.
///
/// The sort is stable, so timeframes of equal duration (including every
/// unrecognised one) keep their input order.
pub fn sort_timeframes(timeframes: &mut [String]) {
    timeframes.sort_by_key(|tf| parse_timeframe(tf));
}
