//! Recurring departure notifications.
//!
//! The [`NotificationScheduler`] only decides *when* a notification should
//! fire and *what* it says. Delivering it is the job of a
//! [`NotificationSink`].

mod sink;

use std::fmt;

use chrono::{DateTime, Utc};
use nextrip_transit::StopNumber;
use tracing::{debug, info};

use crate::tracker::{StopTracker, UpcomingDeparture};

pub use sink::{NotificationSink, TracingSink};

/// Stable handle of a request; survives every resync
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NotificationRequest {
    pub id: NotificationId,
    pub stop: StopNumber,
    pub lead_minutes: u32,
    /// `None` until a qualifying departure has been seen
    pub fire_time: Option<DateTime<Utc>>,
    pub content: Option<String>,
}

impl NotificationRequest {
    fn apply(&mut self, upcoming: &UpcomingDeparture) {
        self.fire_time = Some(upcoming.fire_time);
        self.content = Some(notification_content(upcoming));
    }
}

/// `"<route> <direction> is departing in <N> minute(s)"`
pub fn notification_content(upcoming: &UpcomingDeparture) -> String {
    format!(
        "{} {} is departing in {} minute(s)",
        upcoming.route_direction.route, upcoming.route_direction.direction, upcoming.minutes_until
    )
}

/// Active notification requests for every stop on the board
#[derive(Debug, Default)]
pub struct NotificationScheduler {
    requests: Vec<NotificationRequest>,
    next_id: u64,
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the `(stop, lead_minutes)` request, or reuse the existing one,
    /// and bring it up to date with `tracker`.
    pub fn enable(
        &mut self,
        tracker: &StopTracker,
        lead_minutes: u32,
        now: DateTime<Utc>,
    ) -> &NotificationRequest {
        let stop = tracker.stop_number();
        let index = match self
            .requests
            .iter()
            .position(|r| &r.stop == stop && r.lead_minutes == lead_minutes)
        {
            Some(index) => index,
            None => {
                let id = NotificationId(self.next_id);
                self.next_id += 1;
                info!(stop = %stop, lead_minutes, id = %id, "notification enabled");
                self.requests.push(NotificationRequest {
                    id,
                    stop: stop.clone(),
                    lead_minutes,
                    fire_time: None,
                    content: None,
                });
                self.requests.len() - 1
            }
        };

        let request = &mut self.requests[index];
        if let Some(upcoming) = tracker.next_tracked_departure_at_or_after_lead(lead_minutes, now) {
            request.apply(&upcoming);
        }
        &self.requests[index]
    }

    /// Recompute fire time and content of every request tied to `tracker`.
    ///
    /// A request without a qualifying departure keeps its previous values
    /// until a later resync finds one. Returns how many requests changed.
    pub fn resync(&mut self, tracker: &StopTracker, now: DateTime<Utc>) -> usize {
        let mut updated = 0;

        for request in self.requests.iter_mut().filter(|r| &r.stop == tracker.stop_number()) {
            match tracker.next_tracked_departure_at_or_after_lead(request.lead_minutes, now) {
                Some(upcoming) => {
                    request.apply(&upcoming);
                    updated += 1;
                }
                None => debug!(
                    stop = %request.stop,
                    lead_minutes = request.lead_minutes,
                    "no departure far enough ahead, keeping previous notification"
                ),
            }
        }

        updated
    }

    /// The first active request of a stop, if any
    pub fn status_for(&self, stop: &StopNumber) -> Option<&NotificationRequest> {
        self.requests.iter().find(|r| &r.stop == stop)
    }

    pub fn requests_for<'a>(&'a self, stop: &'a StopNumber) -> impl Iterator<Item = &'a NotificationRequest> + 'a {
        self.requests.iter().filter(move |r| &r.stop == stop)
    }

    pub fn get(&self, id: NotificationId) -> Option<&NotificationRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Remove one `(stop, lead_minutes)` request
    pub fn disable(&mut self, stop: &StopNumber, lead_minutes: u32) -> Option<NotificationRequest> {
        let index = self
            .requests
            .iter()
            .position(|r| &r.stop == stop && r.lead_minutes == lead_minutes)?;
        let removed = self.requests.remove(index);
        info!(stop = %stop, lead_minutes, id = %removed.id, "notification disabled");
        Some(removed)
    }

    /// Remove every request of a stop. Calling it again is a no-op.
    pub fn remove_all(&mut self, stop: &StopNumber) -> Vec<NotificationRequest> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.requests)
            .into_iter()
            .partition(|r| &r.stop == stop);
        self.requests = kept;

        if !removed.is_empty() {
            debug!(stop = %stop, count = removed.len(), "removed notifications");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationRequest> {
        self.requests.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use nextrip_transit::{Departure, RouteDirection};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn dep_in(route: &str, direction: &str, minutes: i64) -> Departure {
        Departure::new(route, direction, now() + Duration::minutes(minutes))
    }

    fn tracker(stop: &str, departures: Vec<Departure>) -> StopTracker {
        let mut tracker = StopTracker::new(StopNumber::new(stop));
        tracker.refresh(departures, now());
        tracker
    }

    #[test]
    fn test_enable_computes_fire_time_and_content() {
        let stop = tracker("100", vec![dep_in("R1", "North", 3), dep_in("R1", "North", 15)]);
        let mut scheduler = NotificationScheduler::new();

        let request = scheduler.enable(&stop, 10, now());
        assert_eq!(request.lead_minutes, 10);
        assert_eq!(request.fire_time, Some(now() + Duration::minutes(5)));
        assert_eq!(request.content.as_deref(), Some("R1 North is departing in 15 minute(s)"));
    }

    #[test]
    fn test_enable_reuses_existing_request() {
        let stop = tracker("100", vec![dep_in("R1", "North", 15)]);
        let mut scheduler = NotificationScheduler::new();

        let first = scheduler.enable(&stop, 10, now()).id;
        let second = scheduler.enable(&stop, 10, now()).id;
        let other_lead = scheduler.enable(&stop, 5, now()).id;

        assert_eq!(first, second);
        assert_ne!(first, other_lead);
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn test_resync_mutates_in_place() {
        let mut stop = tracker("100", vec![dep_in("R1", "North", 15)]);
        let mut scheduler = NotificationScheduler::new();
        let id = scheduler.enable(&stop, 10, now()).id;

        let later = now() + Duration::minutes(1);
        stop.refresh(vec![dep_in("R2", "South", 30)], later);
        assert_eq!(scheduler.resync(&stop, later), 1);

        let request = scheduler.get(id).unwrap();
        assert_eq!(request.fire_time, Some(now() + Duration::minutes(20)));
        assert_eq!(request.content.as_deref(), Some("R2 South is departing in 29 minute(s)"));
    }

    #[test]
    fn test_resync_without_qualifying_departure_keeps_stale_fields() {
        let mut stop = tracker("100", vec![dep_in("R1", "North", 15)]);
        let mut scheduler = NotificationScheduler::new();
        let before = scheduler.enable(&stop, 10, now()).clone();

        stop.refresh(vec![dep_in("R1", "North", 4)], now());
        assert_eq!(scheduler.resync(&stop, now()), 0);
        assert_eq!(scheduler.get(before.id), Some(&before));
    }

    #[test]
    fn test_resync_respects_untracked() {
        let mut stop = StopTracker::new(StopNumber::new("100"));
        stop.untrack(RouteDirection::new("R2", "South"));
        stop.refresh(
            vec![dep_in("R1", "North", 3), dep_in("R2", "South", 8), dep_in("R1", "North", 15)],
            now(),
        );

        let mut scheduler = NotificationScheduler::new();
        let request = scheduler.enable(&stop, 5, now());
        assert_eq!(request.content.as_deref(), Some("R1 North is departing in 15 minute(s)"));
    }

    #[test]
    fn test_resync_only_touches_its_stop() {
        let a = tracker("100", vec![dep_in("R1", "North", 15)]);
        let b = tracker("200", vec![dep_in("R9", "East", 40)]);
        let mut scheduler = NotificationScheduler::new();
        scheduler.enable(&a, 10, now());
        let b_id = scheduler.enable(&b, 10, now()).id;
        let b_before = scheduler.get(b_id).cloned();

        assert_eq!(scheduler.resync(&a, now()), 1);
        assert_eq!(scheduler.get(b_id).cloned(), b_before);
    }

    #[test]
    fn test_status_for() {
        let stop = tracker("100", vec![dep_in("R1", "North", 15)]);
        let mut scheduler = NotificationScheduler::new();
        assert!(scheduler.status_for(stop.stop_number()).is_none());

        scheduler.enable(&stop, 10, now());
        assert!(scheduler.status_for(stop.stop_number()).is_some());
        assert!(scheduler.status_for(&StopNumber::new("200")).is_none());
    }

    #[test]
    fn test_remove_all_is_idempotent() {
        let a = tracker("100", vec![dep_in("R1", "North", 15)]);
        let b = tracker("200", vec![dep_in("R9", "East", 40)]);
        let mut scheduler = NotificationScheduler::new();
        scheduler.enable(&a, 10, now());
        scheduler.enable(&a, 5, now());
        scheduler.enable(&b, 10, now());

        assert_eq!(scheduler.remove_all(a.stop_number()).len(), 2);
        assert!(scheduler.remove_all(a.stop_number()).is_empty());
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.status_for(b.stop_number()).is_some());
    }

    #[test]
    fn test_disable() {
        let stop = tracker("100", vec![dep_in("R1", "North", 15)]);
        let mut scheduler = NotificationScheduler::new();
        scheduler.enable(&stop, 10, now());

        assert!(scheduler.disable(stop.stop_number(), 5).is_none());
        assert!(scheduler.disable(stop.stop_number(), 10).is_some());
        assert!(scheduler.is_empty());
    }
}
