use chrono::{DateTime, Duration, FixedOffset};

/// Matches whose newest event is older than this are presumed abandoned.
pub const STALL_THRESHOLD_HOURS: i64 = 5;

/// Whether a match's newest event is implausibly old. This only answers the
/// question; the scheduling side decides whether to stop polling.
pub fn is_stalled(last_event_time: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
    is_stalled_with_threshold(last_event_time, now, Duration::hours(STALL_THRESHOLD_HOURS))
}

pub fn is_stalled_with_threshold(
    last_event_time: DateTime<FixedOffset>,
    now: DateTime<FixedOffset>,
    threshold: Duration
) -> bool {
    now - last_event_time > threshold
}
