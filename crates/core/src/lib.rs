//! Domain model for the playlist conversion worker.
//!
//! This crate holds the pure domain types and rules: platforms, tracks,
//! playlists, match results, the conversion aggregate with its state
//! machine, the append-only audit record, and the live status projection.
//! It has no knowledge of Postgres, Redis, or HTTP; those layers depend
//! on this crate, never the other way around.

pub mod conversion;
pub mod error;
pub mod log;
pub mod platform;
pub mod playlist;
pub mod status;
pub mod track;
pub mod types;
