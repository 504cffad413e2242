use crate::model::{BookingRequest, Ms, TimeRange, MINUTE_MS};

use super::ports::ResourceLookup;
use super::ValidationError;

pub const MIN_DURATION_MINUTES: f64 = 15.0;
pub const MIN_DURATION_MS: Ms = 15 * MINUTE_MS;

/// Structural checks, first failure wins:
/// range, duration, requester, then resource.
pub fn validate(
    request: &BookingRequest,
    resources: &dyn ResourceLookup,
) -> Result<TimeRange, ValidationError> {
    let range = TimeRange::new(request.start, request.end)?;

    let minutes = range.duration_minutes();
    if minutes < MIN_DURATION_MINUTES {
        return Err(ValidationError::TooShort { minutes });
    }

    if request.requested_by.trim().is_empty() {
        return Err(ValidationError::MissingRequester);
    }

    if !resources.exists(&request.resource_id) {
        return Err(ValidationError::UnknownResource(request.resource_id.clone()));
    }

    Ok(range)
}
