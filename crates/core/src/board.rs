//! The list of stops currently displayed, and their notifications.
//!
//! The board is the single owner of every [`StopTracker`] and of the
//! [`NotificationScheduler`]. Closing a stop drops its tracker and every
//! notification request that referenced it.

use chrono::{DateTime, Utc};
use nextrip_transit::{
    normalize_departures, RawDeparture, RouteDirection, StopMetadata, StopNumber, TransitFeed,
    TransitError,
};
use tracing::{debug, info, warn};

use crate::error::{BoardError, Result};
use crate::notification::{NotificationId, NotificationRequest, NotificationScheduler};
use crate::tracker::{StopName, StopTracker};

#[derive(Debug, Default)]
pub struct Board {
    stops: Vec<StopTracker>,
    scheduler: NotificationScheduler,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stop card. Adding a stop that is already present does nothing.
    pub fn add_stop(&mut self, stop: StopNumber) -> bool {
        if self.contains(&stop) {
            debug!(stop = %stop, "stop already on the board");
            return false;
        }

        info!(stop = %stop, "tracking stop");
        self.stops.push(StopTracker::new(stop));
        true
    }

    pub fn contains(&self, stop: &StopNumber) -> bool {
        self.stops.iter().any(|t| t.stop_number() == stop)
    }

    /// Remove a stop card and every notification tied to it.
    ///
    /// Returns the removed requests so their delivery can be cancelled.
    pub fn close_stop(&mut self, stop: &StopNumber) -> Result<Vec<NotificationRequest>> {
        let index = self
            .stops
            .iter()
            .position(|t| t.stop_number() == stop)
            .ok_or_else(|| BoardError::UnknownStop(stop.clone()))?;

        self.stops.remove(index);
        info!(stop = %stop, "stopped tracking stop");
        Ok(self.scheduler.remove_all(stop))
    }

    pub fn stops(&self) -> &[StopTracker] {
        &self.stops
    }

    pub fn stop_numbers(&self) -> Vec<StopNumber> {
        self.stops.iter().map(|t| t.stop_number().clone()).collect()
    }

    pub fn tracker(&self, stop: &StopNumber) -> Option<&StopTracker> {
        self.stops.iter().find(|t| t.stop_number() == stop)
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    /// Fetch and apply the departures of one stop
    pub async fn refresh_stop(
        &mut self,
        feed: &dyn TransitFeed,
        stop: &StopNumber,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let result = feed.departures(stop).await;
        self.apply_departures(stop, result, now)
    }

    /// Apply the outcome of a departures fetch.
    ///
    /// On failure the stop keeps its previous board and update time. On
    /// success the tracker is rebuilt and its notifications resynced.
    /// Returns the number of departures applied.
    pub fn apply_departures(
        &mut self,
        stop: &StopNumber,
        result: std::result::Result<Vec<RawDeparture>, TransitError>,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let tracker = find_mut(&mut self.stops, stop)?;

        let departures = match result.and_then(|raw| normalize_departures(&raw)) {
            Ok(departures) => departures,
            Err(source) => {
                warn!(stop = %stop, error = %source, "departure refresh failed");
                return Err(BoardError::Feed {
                    stop: stop.clone(),
                    source,
                });
            }
        };

        let count = departures.len();
        tracker.refresh(departures, now);
        self.scheduler.resync(tracker, now);
        Ok(count)
    }

    /// Look up and store the display name of a stop
    pub async fn resolve_stop_name(&mut self, feed: &dyn TransitFeed, stop: &StopNumber) -> Result<()> {
        let result = feed.stop_metadata(stop).await;
        self.apply_stop_metadata(stop, result)
    }

    /// A failed lookup marks the stop name invalid; departures are unaffected.
    pub fn apply_stop_metadata(
        &mut self,
        stop: &StopNumber,
        result: std::result::Result<StopMetadata, TransitError>,
    ) -> Result<()> {
        let tracker = find_mut(&mut self.stops, stop)?;

        let name = match result {
            Ok(meta) => StopName::Resolved(meta.name),
            Err(error) => {
                warn!(stop = %stop, error = %error, "stop lookup failed");
                StopName::Invalid
            }
        };
        tracker.set_stop_name(name);
        Ok(())
    }

    /// Stops whose name has not been resolved yet
    pub fn unnamed_stops(&self) -> Vec<StopNumber> {
        self.stops
            .iter()
            .filter(|t| *t.stop_name() == StopName::Loading)
            .map(|t| t.stop_number().clone())
            .collect()
    }

    /// Enable a recurring notification `lead_minutes` before departures
    pub fn set_notification(
        &mut self,
        stop: &StopNumber,
        lead_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<NotificationId> {
        let tracker = find_mut(&mut self.stops, stop)?;
        tracker.set_notification(lead_minutes);
        Ok(self.scheduler.enable(tracker, lead_minutes, now).id)
    }

    pub fn disable_notification(
        &mut self,
        stop: &StopNumber,
        lead_minutes: u32,
    ) -> Result<Option<NotificationRequest>> {
        let tracker = find_mut(&mut self.stops, stop)?;
        let removed = self.scheduler.disable(stop, lead_minutes);
        if self.scheduler.status_for(stop).is_none() {
            tracker.disable_notification();
        }
        Ok(removed)
    }

    /// Replace the set of route-directions ignored at a stop
    pub fn set_untracked(
        &mut self,
        stop: &StopNumber,
        untracked: impl IntoIterator<Item = RouteDirection>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let tracker = find_mut(&mut self.stops, stop)?;
        tracker.set_untracked(untracked);
        self.scheduler.resync(tracker, now);
        Ok(())
    }

    /// Flip one route-direction between tracked and untracked.
    ///
    /// Returns whether it is tracked afterwards.
    pub fn toggle_tracked(
        &mut self,
        stop: &StopNumber,
        rd: RouteDirection,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let tracker = find_mut(&mut self.stops, stop)?;
        let tracked = if tracker.is_tracked(&rd) {
            tracker.untrack(rd);
            false
        } else {
            tracker.track(&rd);
            true
        };
        self.scheduler.resync(tracker, now);
        Ok(tracked)
    }
}

fn find_mut<'a>(stops: &'a mut [StopTracker], stop: &StopNumber) -> Result<&'a mut StopTracker> {
    stops
        .iter_mut()
        .find(|t| t.stop_number() == stop)
        .ok_or_else(|| BoardError::UnknownStop(stop.clone()))
}
