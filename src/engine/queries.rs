use crate::model::*;

use super::{BookingError, BookingService};

pub const UNKNOWN_RESOURCE_NAME: &str = "Unknown Resource";

impl BookingService {
    /// Bookings matching `filter`, ascending by start.
    pub async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, BookingError> {
        let bookings = self
            .store
            .find_by_date_and_resource(filter.day, filter.resource_id.as_deref())
            .await?;
        Ok(bookings)
    }

    pub fn list_resources(&self) -> Vec<Resource> {
        self.resources.all()
    }

    /// Join a booking with its resource's display name.
    pub fn describe(&self, booking: Booking) -> BookingView {
        let resource_name = self
            .resources
            .get(&booking.resource_id)
            .map(|r| r.name)
            .unwrap_or_else(|| UNKNOWN_RESOURCE_NAME.to_string());
        BookingView { booking, resource_name }
    }
}
