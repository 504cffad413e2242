use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::engine::{BookingError, BookingService};
use crate::model::*;

/// Longest accepted request line.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// One JSON object per line, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    CreateBooking {
        resource_id: String,
        start_time: String,
        end_time: String,
        requested_by: String,
    },
    #[serde(rename_all = "camelCase")]
    ListBookings {
        #[serde(default)]
        resource_id: Option<String>,
        #[serde(default)]
        date: Option<String>,
    },
    CancelBooking {
        id: String,
    },
    ListResources,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    pub id: String,
    pub resource_id: String,
    pub resource_name: String,
    pub start_time: String,
    pub end_time: String,
    pub requested_by: String,
    pub created_at: String,
    pub status: BookingStatus,
}

impl BookingDto {
    pub fn from_view(view: BookingView, now: Ms) -> Self {
        let BookingView { booking, resource_name } = view;
        Self {
            id: booking.id.to_string(),
            status: booking.status(now),
            start_time: format_instant(booking.range.start()),
            end_time: format_instant(booking.range.end()),
            created_at: format_instant(booking.created_at),
            resource_id: booking.resource_id,
            resource_name,
            requested_by: booking.requested_by,
        }
    }
}

/// `status` is an HTTP-equivalent code; exactly one payload field or
/// `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookings: Option<Vec<BookingDto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn ok() -> Self {
        Self { status: 200, ..Default::default() }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

impl From<BookingError> for Response {
    fn from(e: BookingError) -> Self {
        Response::error(e.status_code(), e.to_string())
    }
}

// ── Timestamps ───────────────────────────────────────────────────

/// RFC 3339 instant. Without an offset the wall time is taken as UTC.
pub fn parse_instant(s: &str) -> Result<Ms, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }
    Err(format!("invalid timestamp: {s:?}"))
}

/// `YYYY-MM-DD` → start of that UTC day.
pub fn parse_day(s: &str) -> Result<Ms, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .ok_or_else(|| format!("invalid date: {s:?}"))
}

pub fn format_instant(ms: Ms) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_else(|| ms.to_string())
}

// ── Dispatch ─────────────────────────────────────────────────────

pub async fn execute(service: &BookingService, req: Request) -> Response {
    let now = chrono::Utc::now().timestamp_millis();
    match req {
        Request::CreateBooking {
            resource_id,
            start_time,
            end_time,
            requested_by,
        } => {
            let (start, end) = match (parse_instant(&start_time), parse_instant(&end_time)) {
                (Ok(s), Ok(e)) => (s, e),
                (Err(msg), _) | (_, Err(msg)) => return Response::error(400, msg),
            };
            let request = BookingRequest { resource_id, start, end, requested_by };
            match service.create_booking(request).await {
                Ok(booking) => Response {
                    status: 201,
                    booking: Some(BookingDto::from_view(service.describe(booking), now)),
                    ..Default::default()
                },
                Err(e) => e.into(),
            }
        }
        Request::ListBookings { resource_id, date } => {
            let day = match date.as_deref().map(parse_day).transpose() {
                Ok(day) => day,
                Err(msg) => return Response::error(400, msg),
            };
            let filter = BookingFilter { resource_id, day };
            match service.list_bookings(&filter).await {
                Ok(bookings) => Response {
                    bookings: Some(
                        bookings
                            .into_iter()
                            .map(|b| BookingDto::from_view(service.describe(b), now))
                            .collect(),
                    ),
                    ..Response::ok()
                },
                Err(e) => e.into(),
            }
        }
        Request::CancelBooking { id } => {
            // An id that isn't a ULID can't name a booking.
            let Ok(id) = id.parse::<Ulid>() else {
                return Response::error(404, format!("booking not found: {id}"));
            };
            match service.cancel_booking(id).await {
                Ok(()) => Response::ok(),
                Err(e) => e.into(),
            }
        }
        Request::ListResources => Response {
            resources: Some(service.list_resources()),
            ..Response::ok()
        },
    }
}

/// Parse one line, run it, and record RED metrics.
pub async fn handle_line(service: &BookingService, line: &str) -> Response {
    let req: Request = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            metrics::counter!(crate::observability::REQUESTS_TOTAL, "op" => "invalid", "status" => "400")
                .increment(1);
            return Response::error(400, format!("malformed request: {e}"));
        }
    };
    let op = crate::observability::op_label(&req);
    let started = Instant::now();
    let resp = execute(service, req).await;
    metrics::histogram!(crate::observability::REQUEST_DURATION_SECONDS, "op" => op)
        .record(started.elapsed().as_secs_f64());
    metrics::counter!(crate::observability::REQUESTS_TOTAL, "op" => op, "status" => resp.status.to_string())
        .increment(1);
    if resp.status >= 500 {
        warn!(op, status = resp.status, "request failed: {}", resp.error.as_deref().unwrap_or(""));
    } else {
        debug!(op, status = resp.status, "request handled");
    }
    resp
}

/// Serve one client until it disconnects.
pub async fn process_connection<S>(socket: S, service: BookingService) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(socket, LinesCodec::new_with_max_length(MAX_LINE_LEN));
    while let Some(line) = framed.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let resp = handle_line(&service, &line).await;
        framed.send(serde_json::to_string(&resp)?).await?;
    }
    Ok(())
}
