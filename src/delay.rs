//! Delay arithmetic for time-gated steps.
//!
//! Pure helpers over `chrono` timestamps. Control flow only depends on
//! [`compute_available_at`] and [`is_expired`]; [`format_remaining`] exists
//! for observability and UI feeds.

use crate::flow::DelayUnit;
use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use tracing::warn;

/// Fallback applied when a delay declares a non-positive amount.
pub const MIN_DELAY_MINUTES: i64 = 1;

/// Computes the timestamp at which a delayed step becomes available.
///
/// A non-positive amount never panics; it falls back to a one-minute delay
/// and flags the anomaly.
pub fn compute_available_at(now: DateTime<Utc>, amount: i64, unit: DelayUnit) -> DateTime<Utc> {
    if amount < 1 {
        warn!(
            amount,
            %unit,
            "non-positive delay amount; falling back to the minimal one-minute delay"
        );
        return now + Duration::minutes(MIN_DELAY_MINUTES);
    }
    let offset = match unit {
        DelayUnit::Minutes => Duration::minutes(amount),
        DelayUnit::Hours => Duration::hours(amount),
        DelayUnit::Days => Duration::days(amount),
    };
    now + offset
}

/// Whether a delayed step has become available: `now >= available_at`.
pub fn is_expired(available_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= available_at
}

/// Human-readable breakdown of the remaining wait, e.g. `"1d 3h 12m 5s"`.
pub fn format_remaining(available_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if is_expired(available_at, now) {
        return "due".to_string();
    }

    let total_seconds = (available_at - now).num_seconds();
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .into_iter()
        .filter(|&(value, suffix)| value > 0 || suffix == "s")
        .map(|(value, suffix)| format!("{}{}", value, suffix))
        .join(" ")
}
