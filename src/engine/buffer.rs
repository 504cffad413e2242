use crate::model::{Ms, TimeRange, MINUTE_MS};

/// Minimum gap kept on both sides of every committed booking.
pub const BUFFER_MS: Ms = 10 * MINUTE_MS;

/// `[start - BUFFER_MS, end + BUFFER_MS)`, saturating at the timeline edges.
pub fn buffered(range: &TimeRange) -> TimeRange {
    TimeRange::from_parts_unchecked(
        range.start().saturating_sub(BUFFER_MS),
        range.end().saturating_add(BUFFER_MS),
    )
}
