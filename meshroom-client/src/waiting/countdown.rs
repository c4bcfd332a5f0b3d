use chrono::{DateTime, Utc};
use std::time::Duration;

/// Whole seconds left of `wait` since `started_at`, never negative.
///
/// Elapsed time is floored to whole seconds; a `started_at` in the future
/// (clock skew between participants) counts as no time elapsed.
pub fn time_remaining(now: DateTime<Utc>, started_at: DateTime<Utc>, wait: Duration) -> Duration {
    let elapsed = (now - started_at).num_seconds().max(0) as u64;
    Duration::from_secs(wait.as_secs().saturating_sub(elapsed))
}

/// `MM:SS`
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
