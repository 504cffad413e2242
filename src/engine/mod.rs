pub mod buffer;
pub mod conflict;
mod error;
mod mutations;
pub mod ports;
mod queries;
pub mod validator;

pub use buffer::{buffered, BUFFER_MS};
pub use conflict::{find_conflict, has_conflict};
pub use error::{BookingError, StoreError, ValidationError};
pub use ports::{BookingStore, ResourceLookup};
pub use validator::validate;

use std::sync::Arc;

/// Stateless orchestrator in front of a store and a catalog.
///
/// Holds no bookings of its own; every call reads the store fresh, so one
/// service can be shared across tasks and resources.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    resources: Arc<dyn ResourceLookup>,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, resources: Arc<dyn ResourceLookup>) -> Self {
        Self { store, resources }
    }
}
