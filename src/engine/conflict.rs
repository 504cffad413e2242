use crate::model::*;

use super::buffer::buffered;

pub(crate) fn now_ms() -> Ms {
    chrono::Utc::now().timestamp_millis()
}

/// True if `candidate` intersects the buffered form of any `existing` range.
///
/// Only the existing side is widened. The candidate is taken exactly as
/// requested, so a new booking needs `BUFFER_MS` of clearance, not twice that.
pub fn has_conflict(candidate: &TimeRange, existing: &[TimeRange]) -> bool {
    existing.iter().any(|r| buffered(r).overlaps(candidate))
}

/// First booking on `resource_id` whose buffered range `candidate` hits.
/// Bookings on other resources are ignored whatever their times.
pub fn find_conflict<'a>(
    resource_id: &str,
    candidate: &TimeRange,
    existing: &'a [Booking],
) -> Option<&'a Booking> {
    existing
        .iter()
        .filter(|b| b.resource_id == resource_id)
        .find(|b| buffered(&b.range).overlaps(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::BUFFER_MS;
    use ulid::Ulid;

    const M: Ms = MINUTE_MS;
    const H: Ms = 60 * M;

    fn range(start: Ms, end: Ms) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    fn booking_on(resource_id: &str, start: Ms, end: Ms) -> Booking {
        Booking {
            id: Ulid::new(),
            resource_id: resource_id.into(),
            range: range(start, end),
            requested_by: "John Doe".into(),
            created_at: 0,
        }
    }

    /// Existing booking `[14:00, 15:30)`.
    fn afternoon() -> TimeRange {
        range(14 * H, 15 * H + 30 * M)
    }

    #[test]
    fn empty_existing_never_conflicts() {
        assert!(!has_conflict(&range(0, H), &[]));
    }

    #[test]
    fn direct_overlap_conflicts() {
        assert!(has_conflict(&range(15 * H, 16 * H), &[afternoon()]));
        assert!(has_conflict(&range(14 * H + 15 * M, 14 * H + 45 * M), &[afternoon()]));
        assert!(has_conflict(&range(13 * H, 17 * H), &[afternoon()]));
    }

    #[test]
    fn gap_after_five_minutes_conflicts() {
        assert!(has_conflict(&range(15 * H + 35 * M, 16 * H), &[afternoon()]));
    }

    #[test]
    fn gap_after_nine_minutes_conflicts() {
        assert!(has_conflict(&range(15 * H + 39 * M, 16 * H), &[afternoon()]));
    }

    #[test]
    fn gap_after_exactly_buffer_is_free() {
        assert!(!has_conflict(&range(15 * H + 40 * M, 16 * H), &[afternoon()]));
    }

    #[test]
    fn gap_before_exactly_buffer_is_free() {
        // Ends at 13:50, buffer starts at 13:50.
        assert!(!has_conflict(&range(13 * H, 13 * H + 50 * M), &[afternoon()]));
    }

    #[test]
    fn gap_before_nine_minutes_conflicts() {
        assert!(has_conflict(&range(13 * H, 13 * H + 51 * M), &[afternoon()]));
    }

    #[test]
    fn one_millisecond_into_buffer_conflicts() {
        let existing = afternoon();
        let buffer_end = existing.end() + BUFFER_MS;
        assert!(has_conflict(&range(buffer_end - 1, buffer_end + H), &[existing]));
        assert!(!has_conflict(&range(buffer_end, buffer_end + H), &[existing]));
    }

    #[test]
    fn buffer_is_one_sided() {
        // Symmetric buffering would demand 20 minutes here; 10 is enough.
        let existing = range(10 * H, 11 * H);
        let candidate = range(11 * H + BUFFER_MS, 12 * H);
        assert!(!has_conflict(&candidate, &[existing]));
        assert!(!has_conflict(&existing, &[candidate]));
    }

    #[test]
    fn any_existing_can_trigger() {
        let existing = [range(8 * H, 9 * H), range(12 * H, 13 * H), afternoon()];
        assert!(has_conflict(&range(13 * H + 5 * M, 13 * H + 30 * M), &existing));
        assert!(!has_conflict(&range(10 * H, 11 * H + 50 * M), &existing));
    }

    #[test]
    fn find_conflict_returns_first_colliding_booking() {
        let a = booking_on("r", 9 * H, 10 * H);
        let b = booking_on("r", 14 * H, 15 * H + 30 * M);
        let c = booking_on("r", 16 * H, 17 * H);
        let existing = vec![a, b.clone(), c];
        let hit = find_conflict("r", &range(15 * H + 35 * M, 15 * H + 55 * M), &existing);
        assert_eq!(hit.map(|x| x.id), Some(b.id));
    }

    #[test]
    fn find_conflict_none_when_clear() {
        let existing = vec![booking_on("r", 14 * H, 15 * H + 30 * M)];
        assert!(find_conflict("r", &range(15 * H + 40 * M, 16 * H), &existing).is_none());
    }

    #[test]
    fn other_resources_never_conflict() {
        let existing = vec![booking_on("conf-room-b", 14 * H, 15 * H + 30 * M)];
        assert!(find_conflict("conf-room-a", &afternoon(), &existing).is_none());
        assert!(find_conflict("conf-room-b", &afternoon(), &existing).is_some());
    }
}
