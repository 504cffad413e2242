use thiserror::Error;
use ulid::Ulid;

use crate::model::{Booking, BookingView, Ms, MINUTE_MS};

use super::buffer::BUFFER_MS;

/// User-input errors caught before any store access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("end time must be after start time")]
    InvalidRange,
    #[error("booking must be at least 15 minutes long (got {minutes} minutes)")]
    TooShort { minutes: f64 },
    #[error("requested by field is required")]
    MissingRequester,
    #[error("unknown resource: {0}")]
    UnknownResource(String),
}

/// Everything `BookingService` can hand back to its caller.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(
        "time slot conflicts with booking {} on {} from {} to {} (including {}-minute buffer)",
        .0.booking.id,
        .0.resource_name,
        display_ms(.0.booking.range.start()),
        display_ms(.0.booking.range.end()),
        BUFFER_MS / MINUTE_MS
    )]
    Conflict(Box<BookingView>),
    #[error("booking not found: {0}")]
    NotFound(Ulid),
    #[error("store error: {0}")]
    Store(String),
}

impl BookingError {
    /// HTTP-equivalent status for the outer layer.
    pub fn status_code(&self) -> u16 {
        match self {
            BookingError::Validation(_) => 400,
            BookingError::Conflict(_) => 409,
            BookingError::NotFound(_) => 404,
            BookingError::Store(_) => 500,
        }
    }

    pub fn conflicting_booking(&self) -> Option<&Booking> {
        match self {
            BookingError::Conflict(view) => Some(&view.booking),
            _ => None,
        }
    }
}

/// Failures reported by a `BookingStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's own commit-time exclusion check rejected the insert.
    #[error("insert rejected: overlaps booking {}", .0.id)]
    Conflict(Box<Booking>),
    #[error("booking not found: {0}")]
    NotFound(Ulid),
    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        match e {
            // No catalog here: the id stands in for the name until
            // `BookingService` replaces it.
            StoreError::Conflict(b) => BookingError::Conflict(Box::new(BookingView {
                resource_name: b.resource_id.clone(),
                booking: *b,
            })),
            StoreError::NotFound(id) => BookingError::NotFound(id),
            StoreError::Backend(msg) => BookingError::Store(msg),
        }
    }
}

fn display_ms(ms: Ms) -> String {
    match chrono::DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%b %-d %H:%M UTC").to_string(),
        None => ms.to_string(),
    }
}
