use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use ulid::Ulid;

use crate::engine::{find_conflict, BookingStore, StoreError};
use crate::model::*;

/// Committed bookings of one resource, sorted by `range.start`.
#[derive(Debug, Default)]
pub struct ResourceBookings {
    pub bookings: Vec<Booking>,
}

impl ResourceBookings {
    /// Insert maintaining sort order by start.
    pub fn insert_sorted(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .partition_point(|b| b.range.start() <= booking.range.start());
        self.bookings.insert(pos, booking);
    }

    pub fn remove(&mut self, id: Ulid) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }
}

pub type SharedResourceBookings = Arc<RwLock<ResourceBookings>>;

/// Per-resource locked booking table.
///
/// Readers of different resources never contend; a writer holds its
/// resource's lock across the exclusion check and the write.
pub struct InMemoryStore {
    resources: DashMap<String, SharedResourceBookings>,
    /// Reverse lookup: booking id → resource id
    booking_to_resource: DashMap<Ulid, String>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            resources: DashMap::new(),
            booking_to_resource: DashMap::new(),
        }
    }

    pub fn booking_count(&self) -> usize {
        self.booking_to_resource.len()
    }

    pub fn get_resource_for_booking(&self, id: &Ulid) -> Option<String> {
        self.booking_to_resource.get(id).map(|e| e.value().clone())
    }

    fn get_or_create(&self, resource_id: &str) -> SharedResourceBookings {
        if let Some(entry) = self.resources.get(resource_id) {
            return entry.value().clone();
        }
        self.resources
            .entry(resource_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Write lock on one resource's bookings, creating the slot if needed.
    pub async fn write_resource(&self, resource_id: &str) -> OwnedRwLockWriteGuard<ResourceBookings> {
        self.get_or_create(resource_id).write_owned().await
    }

    /// Commit-time exclusion check. Caller holds the resource's write lock.
    pub fn check_insert(rb: &ResourceBookings, booking: &Booking) -> Result<(), StoreError> {
        if let Some(hit) = find_conflict(&booking.resource_id, &booking.range, &rb.bookings) {
            return Err(StoreError::Conflict(Box::new(hit.clone())));
        }
        Ok(())
    }

    /// Apply a committed booking without re-checking. Caller holds the lock.
    pub fn apply_insert(&self, rb: &mut ResourceBookings, booking: Booking) {
        self.booking_to_resource
            .insert(booking.id, booking.resource_id.clone());
        rb.insert_sorted(booking);
    }

    pub fn apply_remove(&self, rb: &mut ResourceBookings, id: Ulid) -> Option<Booking> {
        self.booking_to_resource.remove(&id);
        rb.remove(id)
    }

    /// Every live booking, ascending by start.
    pub async fn snapshot(&self) -> Vec<Booking> {
        self.collect(None, None).await
    }

    async fn collect(&self, day: Option<Ms>, resource_id: Option<&str>) -> Vec<Booking> {
        let shards: Vec<SharedResourceBookings> = match resource_id {
            Some(rid) => self.resources.get(rid).map(|e| e.value().clone()).into_iter().collect(),
            None => self.resources.iter().map(|e| e.value().clone()).collect(),
        };
        let window = day.map(TimeRange::day);

        let mut out = Vec::new();
        for shard in shards {
            let guard = shard.read().await;
            out.extend(
                guard
                    .bookings
                    .iter()
                    .filter(|b| window.is_none_or(|w| w.contains_instant(b.range.start())))
                    .cloned(),
            );
        }
        // Id breaks start ties so repeated listings come back identical.
        out.sort_by(|a, b| {
            a.range
                .start()
                .cmp(&b.range.start())
                .then_with(|| a.id.cmp(&b.id))
        });
        out
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn find_by_resource(&self, resource_id: &str) -> Result<Vec<Booking>, StoreError> {
        let Some(shard) = self.resources.get(resource_id).map(|e| e.value().clone()) else {
            return Ok(Vec::new());
        };
        let guard = shard.read().await;
        Ok(guard.bookings.clone())
    }

    async fn find_by_date_and_resource(
        &self,
        day: Option<Ms>,
        resource_id: Option<&str>,
    ) -> Result<Vec<Booking>, StoreError> {
        Ok(self.collect(day, resource_id).await)
    }

    async fn insert(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut guard = self.write_resource(&booking.resource_id).await;
        Self::check_insert(&guard, &booking)?;
        self.apply_insert(&mut guard, booking.clone());
        Ok(booking)
    }

    async fn delete(&self, id: Ulid) -> Result<(), StoreError> {
        let resource_id = self
            .get_resource_for_booking(&id)
            .ok_or(StoreError::NotFound(id))?;
        let mut guard = self.write_resource(&resource_id).await;
        self.apply_remove(&mut guard, id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
