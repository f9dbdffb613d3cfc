//! The feed interface consumed by stop tracking.
//!
//! Implementations can be in-memory, HTTP-backed, or anything else that can
//! answer "what leaves this stop next" and "what is this stop called".

use std::future::Future;
use std::pin::Pin;

use crate::identifiers::StopNumber;
use crate::models::types::*;

/// Source of live departures and stop metadata
pub trait TransitFeed: Send + Sync {
    /// Upcoming departures at a stop, in ascending departure order.
    ///
    /// Timestamps are returned as delivered; callers normalize them.
    fn departures<'a>(
        &'a self,
        stop: &'a StopNumber,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawDeparture>>> + Send + 'a>>;

    /// Display information for a stop
    fn stop_metadata<'a>(
        &'a self,
        stop: &'a StopNumber,
    ) -> Pin<Box<dyn Future<Output = Result<StopMetadata>> + Send + 'a>>;
}
