use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};
use ulid::Ulid;

use crate::engine::{BookingStore, StoreError};
use crate::model::*;
use crate::store::{InMemoryStore, ResourceBookings};
use crate::wal::Wal;

/// `InMemoryStore` whose every commit and cancel is logged before it is applied.
///
/// Writers take the resource write lock, then the WAL mutex, so the
/// exclusion check, the durable append and the in-memory apply happen as one
/// step per resource.
pub struct WalStore {
    inner: InMemoryStore,
    wal: Mutex<Wal>,
}

fn wal_err(e: io::Error) -> StoreError {
    StoreError::Backend(format!("WAL error: {e}"))
}

impl WalStore {
    /// Replay `path` (if present) and open it for appends.
    pub async fn open(path: PathBuf) -> io::Result<Self> {
        let events = Wal::replay(&path)?;
        let wal = Wal::open(&path)?;
        let inner = InMemoryStore::new();

        for event in &events {
            match event {
                Event::BookingCommitted { booking } => {
                    let mut guard = inner.write_resource(&booking.resource_id).await;
                    inner.apply_insert(&mut guard, booking.clone());
                }
                Event::BookingCancelled { id, resource_id } => {
                    let mut guard = inner.write_resource(resource_id).await;
                    inner.apply_remove(&mut guard, *id);
                }
            }
        }
        info!(
            path = %path.display(),
            events = events.len(),
            bookings = inner.booking_count(),
            "booking log replayed"
        );

        Ok(Self {
            inner,
            wal: Mutex::new(wal),
        })
    }

    pub fn booking_count(&self) -> usize {
        self.inner.booking_count()
    }

    pub async fn appends_since_compact(&self) -> u64 {
        self.wal.lock().await.appends_since_compact()
    }

    /// Rewrite the log as one `BookingCommitted` per live booking.
    ///
    /// The snapshot is taken without the WAL mutex (commits lock their
    /// resource first, then the WAL). If anything was appended meanwhile the
    /// snapshot may be stale, so nothing is written and `None` comes back.
    pub async fn compact(&self) -> io::Result<Option<usize>> {
        let seen = self.wal.lock().await.sequence();
        let events: Vec<Event> = self
            .inner
            .snapshot()
            .await
            .into_iter()
            .map(|booking| Event::BookingCommitted { booking })
            .collect();

        let mut wal = self.wal.lock().await;
        if wal.sequence() != seen {
            debug!(path = %wal.path().display(), "appends during compaction snapshot, skipping");
            return Ok(None);
        }
        wal.compact(&events)?;
        debug!(path = %wal.path().display(), events = events.len(), "booking log compacted");
        Ok(Some(events.len()))
    }

    async fn log(&self, event: &Event) -> Result<(), StoreError> {
        self.wal.lock().await.append(event).map_err(wal_err)
    }

    async fn commit(&self, rb: &mut ResourceBookings, booking: Booking) -> Result<Booking, StoreError> {
        InMemoryStore::check_insert(rb, &booking)?;
        self.log(&Event::BookingCommitted { booking: booking.clone() }).await?;
        self.inner.apply_insert(rb, booking.clone());
        Ok(booking)
    }
}

#[async_trait]
impl BookingStore for WalStore {
    async fn find_by_resource(&self, resource_id: &str) -> Result<Vec<Booking>, StoreError> {
        self.inner.find_by_resource(resource_id).await
    }

    async fn find_by_date_and_resource(
        &self,
        day: Option<Ms>,
        resource_id: Option<&str>,
    ) -> Result<Vec<Booking>, StoreError> {
        self.inner.find_by_date_and_resource(day, resource_id).await
    }

    async fn insert(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut guard = self.inner.write_resource(&booking.resource_id).await;
        self.commit(&mut guard, booking).await
    }

    async fn delete(&self, id: Ulid) -> Result<(), StoreError> {
        let resource_id = self
            .inner
            .get_resource_for_booking(&id)
            .ok_or(StoreError::NotFound(id))?;
        let mut guard = self.inner.write_resource(&resource_id).await;
        // Re-check under the lock: a concurrent cancel may have won.
        if !guard.bookings.iter().any(|b| b.id == id) {
            return Err(StoreError::NotFound(id));
        }
        self.log(&Event::BookingCancelled { id, resource_id }).await?;
        self.inner.apply_remove(&mut guard, id);
        Ok(())
    }
}

/// Convenience for callers that only have a directory.
pub fn wal_path(data_dir: &Path) -> PathBuf {
    data_dir.join("bookings.wal")
}
