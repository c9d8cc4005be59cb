//! Trait definitions for session fetchers.
//!
//! The poller only talks to a [`SessionSource`], so tests and alternative
//! backends can stand in for the Plex client.

use std::future::Future;

use plexatv_core::models::RawSession;

/// Anything that can report the playback sessions active right now.
pub trait SessionSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the current sessions, in server order.
    fn fetch_sessions(&self)
        -> impl Future<Output = Result<Vec<RawSession>, Self::Error>> + Send;
}
