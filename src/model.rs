use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::ValidationError;

/// Unix milliseconds. Every instant lives on this one timeline.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;
pub const DAY_MS: Ms = 24 * 60 * MINUTE_MS;

/// Half-open interval `[start, end)` with `end > start`.
///
/// Fields are private so a range can only come out of [`TimeRange::new`];
/// deserialization goes through the same check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct TimeRange {
    start: Ms,
    end: Ms,
}

#[derive(Deserialize)]
struct RawRange {
    start: Ms,
    end: Ms,
}

impl TryFrom<RawRange> for TimeRange {
    type Error = ValidationError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        TimeRange::new(raw.start, raw.end)
    }
}

impl TimeRange {
    pub fn new(start: Ms, end: Ms) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// The calendar day beginning at `day_start`: `[day_start, day_start + 24h)`.
    pub fn day(day_start: Ms) -> Self {
        Self {
            start: day_start,
            end: day_start.saturating_add(DAY_MS),
        }
    }

    /// Caller guarantees `start < end`.
    pub(crate) fn from_parts_unchecked(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "TimeRange start must be before end");
        Self { start, end }
    }

    pub fn start(&self) -> Ms {
        self.start
    }

    pub fn end(&self) -> Ms {
        self.end
    }

    /// Exact for every valid range, including ones wider than `Ms::MAX`.
    pub fn duration_ms(&self) -> u64 {
        self.end.abs_diff(self.start)
    }

    /// Fractional minutes, never rounded.
    pub fn duration_minutes(&self) -> f64 {
        self.duration_ms() as f64 / MINUTE_MS as f64
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Bookable thing from the catalog. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// A committed reservation. Only `BookingService::create_booking` mints these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub resource_id: String,
    pub range: TimeRange,
    pub requested_by: String,
    pub created_at: Ms,
}

impl Booking {
    /// Ongoing includes the end instant itself, so a booking that just
    /// finished still reads as ongoing for that one millisecond.
    pub fn status(&self, now: Ms) -> BookingStatus {
        if now < self.range.start() {
            BookingStatus::Upcoming
        } else if now <= self.range.end() {
            BookingStatus::Ongoing
        } else {
            BookingStatus::Past
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Upcoming,
    Ongoing,
    Past,
}

/// Raw creation input. Nothing here has been checked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub resource_id: String,
    pub start: Ms,
    pub end: Ms,
    pub requested_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub resource_id: Option<String>,
    /// Start instant of a calendar day; matches bookings starting in `[day, day + 24h)`.
    pub day: Option<Ms>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(rid) = &self.resource_id
            && booking.resource_id != *rid
        {
            return false;
        }
        match self.day {
            Some(day) => TimeRange::day(day).contains_instant(booking.range.start()),
            None => true,
        }
    }
}

/// A booking joined with its resource's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingView {
    pub booking: Booking,
    pub resource_name: String,
}

// ── WAL records ──────────────────────────────────────────────────

/// Flat event log format for durable stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    BookingCommitted { booking: Booking },
    BookingCancelled { id: Ulid, resource_id: String },
}
