//! # nextrip-transit
//!
//! Value types and feed interfaces for live stop departures.
//!
//! ## Features
//!
//! - **Value-keyed identifiers**: stops, routes and directions compare by text
//! - **Timestamp normalization**: NexTrip `/Date(..)/`, RFC 3339 and epoch millis
//! - **Pluggable feeds**: implement [`TransitFeed`] over any transport
//! - **Stop directory**: R-tree backed nearby-stop queries
//!
//! ## Example
//!
//! ```
//! use nextrip_transit::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! let raw = RawDeparture {
//!     route: RouteIdentifier::new("21"),
//!     direction: DirectionName::new("EASTBOUND"),
//!     departure_time: RawTime::Text("/Date(1510000090000-0600)/".into()),
//! };
//!
//! let departure = Departure::from_raw(&raw).unwrap();
//! let now = Utc.timestamp_opt(1_510_000_000, 0).unwrap();
//!
//! // 90 seconds away rounds up to two minutes
//! assert_eq!(departure.minutes_until(now), 2);
//! assert_eq!(departure.route_direction(), RouteDirection::new("21", "EASTBOUND"));
//! ```

pub mod identifiers;
pub mod models;
pub mod network;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{traits::*, types::*};
    pub use crate::network::traits::*;
    pub use crate::provider::{StaticTransitFeed, StopRecord};
}

pub use prelude::*;
