//! Departure data models, types, and traits.

pub mod time;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use traits::TransitFeed;
pub use types::{
    minutes_until, normalize_departures, Departure, RawDeparture, RawTime, Result, RouteDirection,
    StopMetadata, TransitError,
};
