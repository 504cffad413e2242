use async_trait::async_trait;
use ulid::Ulid;

use crate::model::{Booking, Ms, Resource};

use super::StoreError;

/// Read-only view of the resource catalog.
pub trait ResourceLookup: Send + Sync {
    fn get(&self, resource_id: &str) -> Option<Resource>;

    fn exists(&self, resource_id: &str) -> bool {
        self.get(resource_id).is_some()
    }

    fn all(&self) -> Vec<Resource>;
}

/// Canonical owner of booking records. The engine only sees snapshots.
///
/// `insert` must re-check the buffered overlap against committed bookings
/// of the same resource atomically with the write, and reject the loser of
/// a concurrent race with `StoreError::Conflict`.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Unbuffered bookings of one resource, in no particular order.
    async fn find_by_resource(&self, resource_id: &str) -> Result<Vec<Booking>, StoreError>;

    /// Bookings starting in `[day, day + 24h)` (when given) on `resource_id`
    /// (when given), ascending by start.
    async fn find_by_date_and_resource(
        &self,
        day: Option<Ms>,
        resource_id: Option<&str>,
    ) -> Result<Vec<Booking>, StoreError>;

    async fn insert(&self, booking: Booking) -> Result<Booking, StoreError>;

    async fn delete(&self, id: Ulid) -> Result<(), StoreError>;
}
