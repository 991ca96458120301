//! Production adapters for the foodscout search pipeline.
//!
//! Responsibilities:
//! - Persist discovery-cache documents in SQLite ([`sqlite`]).
//! - Fetch nearby restaurants from the Google Places Nearby Search API
//!   ([`places`]).
//! - Replay recorded Nearby Search responses from disk for offline runs and
//!   tests ([`places::FixturePlacesProvider`]).
//!
//! Boundaries:
//! - Do not encode cache rules; containment and orchestration live in
//!   `foodscout-core`.
//! - Keep the core traits synchronous; HTTP calls block on a private runtime.

pub mod places;
#[cfg(feature = "store-sqlite")]
pub mod sqlite;
