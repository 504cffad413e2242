//! Resource booking with buffered conflict detection.
//!
//! [`engine`] holds the rules: ranges, the 10-minute buffer, conflict
//! detection, request validation and the [`engine::BookingService`] that
//! orchestrates them over pluggable store and catalog traits. The other
//! modules are collaborators: an in-memory store, a write-ahead-logged store,
//! a static catalog and a JSON-lines TCP front end.

pub mod catalog;
pub mod compactor;
pub mod config;
pub mod durable;
pub mod engine;
pub mod model;
pub mod observability;
pub mod store;
pub mod wal;
pub mod wire;
