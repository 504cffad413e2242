use ulid::Ulid;

use crate::model::*;

use super::conflict::{find_conflict, now_ms};
use super::validator::validate;
use super::{BookingError, BookingService, StoreError};

impl BookingService {
    /// Received → Validated → ConflictChecked → Committed, or rejected at
    /// the first stage that fails.
    pub async fn create_booking(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        let range = validate(&request, self.resources.as_ref())?;

        // Always a fresh read: a cached set would let stale state through.
        let existing = self.store.find_by_resource(&request.resource_id).await?;
        if let Some(hit) = find_conflict(&request.resource_id, &range, &existing) {
            return Err(self.conflict(hit.clone()));
        }

        let booking = Booking {
            id: Ulid::new(),
            resource_id: request.resource_id,
            range,
            requested_by: request.requested_by,
            created_at: now_ms(),
        };
        // A store-side conflict here means another writer won the race
        // between our read and this insert.
        let committed = self.store.insert(booking).await.map_err(|e| match e {
            StoreError::Conflict(winner) => self.conflict(*winner),
            other => other.into(),
        })?;
        Ok(committed)
    }

    pub async fn cancel_booking(&self, id: Ulid) -> Result<(), BookingError> {
        self.store.delete(id).await?;
        Ok(())
    }

    fn conflict(&self, existing: Booking) -> BookingError {
        BookingError::Conflict(Box::new(self.describe(existing)))
    }
}
