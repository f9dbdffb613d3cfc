//! Core data types for live departure data.

use std::cmp::Ordering;
use std::fmt;
use std::iter;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use geo::Point;

use crate::identifiers::*;
use crate::models::time;

// ============================================================================
// Route-direction key
// ============================================================================

/// A transit line together with its direction of travel.
///
/// Equality and hashing are by value. Ordering follows the display string
/// `"route direction"`, with `(route, direction)` as a tie-break so that the
/// order never disagrees with equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteDirection {
    pub route: RouteIdentifier,
    pub direction: DirectionName,
}

impl RouteDirection {
    pub fn new(route: impl Into<RouteIdentifier>, direction: impl Into<DirectionName>) -> Self {
        Self {
            route: route.into(),
            direction: direction.into(),
        }
    }

    fn display_key(&self) -> impl Iterator<Item = u8> + '_ {
        self.route
            .as_str()
            .bytes()
            .chain(iter::once(b' '))
            .chain(self.direction.as_str().bytes())
    }
}

impl PartialOrd for RouteDirection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RouteDirection {
    fn cmp(&self, other: &Self) -> Ordering {
        self.display_key()
            .cmp(other.display_key())
            .then_with(|| self.route.cmp(&other.route))
            .then_with(|| self.direction.cmp(&other.direction))
    }
}

impl fmt::Display for RouteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.route, self.direction)
    }
}

// ============================================================================
// Departures
// ============================================================================

/// Timestamp exactly as the feed delivered it, before normalization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawTime {
    /// `/Date(1510000000000-0600)/`, RFC 3339, or a decimal epoch-millisecond string
    Text(String),
    EpochMillis(i64),
}

/// A departure as delivered by a [`TransitFeed`](crate::models::traits::TransitFeed)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDeparture {
    pub route: RouteIdentifier,
    pub direction: DirectionName,
    pub departure_time: RawTime,
}

/// One scheduled departure of a route-direction at a stop
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Departure {
    pub route: RouteIdentifier,
    pub direction: DirectionName,
    pub departure_time: DateTime<Utc>,
}

impl Departure {
    pub fn new(
        route: impl Into<RouteIdentifier>,
        direction: impl Into<DirectionName>,
        departure_time: DateTime<Utc>,
    ) -> Self {
        Self {
            route: route.into(),
            direction: direction.into(),
            departure_time,
        }
    }

    /// Normalize a feed departure into a comparable instant.
    pub fn from_raw(raw: &RawDeparture) -> Result<Self> {
        Ok(Self {
            route: raw.route.clone(),
            direction: raw.direction.clone(),
            departure_time: time::normalize(&raw.departure_time)?,
        })
    }

    pub fn route_direction(&self) -> RouteDirection {
        RouteDirection {
            route: self.route.clone(),
            direction: self.direction.clone(),
        }
    }

    /// Whole minutes until this departure, rounded up.
    pub fn minutes_until(&self, now: DateTime<Utc>) -> i64 {
        minutes_until(self.departure_time, now)
    }

    /// The instant `lead_minutes` before this departure, or `None` when that
    /// instant falls outside the representable range
    pub fn minus_lead(&self, lead_minutes: u32) -> Option<DateTime<Utc>> {
        self.departure_time
            .checked_sub_signed(Duration::minutes(i64::from(lead_minutes)))
    }
}

/// Normalize a whole feed response, failing on the first malformed entry.
pub fn normalize_departures(raw: &[RawDeparture]) -> Result<Vec<Departure>> {
    raw.iter().map(Departure::from_raw).collect()
}

/// Minutes from `now` until `at`, using ceiling division.
///
/// 61 seconds away is 2 minutes, 60 seconds is 1, and anything at or before
/// `now` is 0 or negative.
pub fn minutes_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const MINUTE_MS: i64 = 60_000;

    let ms = (at - now).num_milliseconds();
    let whole = ms.div_euclid(MINUTE_MS);
    if ms.rem_euclid(MINUTE_MS) == 0 {
        whole
    } else {
        whole + 1
    }
}

// ============================================================================
// Stops
// ============================================================================

/// Descriptive information about a stop
#[derive(Clone, Debug, PartialEq)]
pub struct StopMetadata {
    pub stop_number: StopNumber,
    pub name: Arc<str>,
    pub location: Option<Point>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Stop not found: {0}")]
    StopNotFound(StopNumber),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid departure timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;
