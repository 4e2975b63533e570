#![forbid(unsafe_code)]

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;

/// Lenient filter parsing: `None` means "filter not applied", by contract.
/// Malformed optional input is dropped, never surfaced as an error.
pub fn parse_day_filter(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<Date>().ok()
}

pub fn parse_score_filter(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i32>().ok()
}

pub fn parse_id_filter(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u64>().ok()
}

/// Calendar day (UTC) a timestamp falls on. Comparing days reproduces the
/// "start of day" / "end of day 23:59:59" filter bounds exactly.
pub fn utc_day(ts: Timestamp) -> Date {
    ts.to_zoned(TimeZone::UTC).date()
}

/// Aggregates over a filtered score set. All fields report 0 on the empty
/// set, a policy choice mirrored by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreStats {
    pub count: usize,
    pub mean: f64,
    pub min: i32,
    pub max: i32,
}

pub fn score_stats(scores: &[i32]) -> ScoreStats {
    if scores.is_empty() {
        return ScoreStats::default();
    }
    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    let mean = round_2dp(sum as f64 / scores.len() as f64);
    let min = scores.iter().copied().min().unwrap_or(0);
    let max = scores.iter().copied().max().unwrap_or(0);
    ScoreStats {
        count: scores.len(),
        mean,
        min,
        max,
    }
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
