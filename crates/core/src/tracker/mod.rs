//! Per-stop departure tracking.
//!
//! A [`StopTracker`] holds the latest departure board of one stop, the set
//! of route-directions the user chose to ignore, and the derived "next
//! notification" for the stop.

mod grouping;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use nextrip_transit::{Departure, RouteDirection, StopNumber};
use tracing::debug;

pub use grouping::group_by_route_direction;

/// Display name of a stop, resolved asynchronously
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StopName {
    #[default]
    Loading,
    Resolved(Arc<str>),
    /// The feed could not describe the stop
    Invalid,
}

impl fmt::Display for StopName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopName::Loading => f.write_str("Loading..."),
            StopName::Resolved(name) => f.write_str(name),
            StopName::Invalid => f.write_str("Invalid Stop"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerState {
    /// No refresh has succeeded yet
    Unloaded,
    Loaded,
}

/// A tracked departure far enough ahead for a lead-time notification
#[derive(Clone, Debug, PartialEq)]
pub struct UpcomingDeparture {
    pub minutes_until: i64,
    pub fire_time: DateTime<Utc>,
    pub departure: Departure,
    pub route_direction: RouteDirection,
}

#[derive(Clone, Debug)]
pub struct StopTracker {
    stop_number: StopNumber,
    stop_name: StopName,

    // Rebuilt on every refresh; None until the first one
    all_route_directions: Option<Vec<RouteDirection>>,
    departures_by_route_direction: BTreeMap<RouteDirection, Vec<Departure>>,
    latest_departures: Vec<Departure>,
    last_update_time: Option<DateTime<Utc>>,

    // Survives refreshes, matched by value
    untracked_route_directions: BTreeSet<RouteDirection>,

    notification_enabled: bool,
    notification_lead_minutes: u32,
    next_notification_time: Option<DateTime<Utc>>,
    next_notification_departure: Option<Departure>,
}

impl StopTracker {
    pub fn new(stop_number: StopNumber) -> Self {
        Self {
            stop_number,
            stop_name: StopName::Loading,
            all_route_directions: None,
            departures_by_route_direction: BTreeMap::new(),
            latest_departures: Vec::new(),
            last_update_time: None,
            untracked_route_directions: BTreeSet::new(),
            notification_enabled: false,
            notification_lead_minutes: 0,
            next_notification_time: None,
            next_notification_departure: None,
        }
    }

    pub fn stop_number(&self) -> &StopNumber {
        &self.stop_number
    }

    pub fn stop_name(&self) -> &StopName {
        &self.stop_name
    }

    pub fn set_stop_name(&mut self, name: StopName) {
        self.stop_name = name;
    }

    pub fn state(&self) -> TrackerState {
        if self.last_update_time.is_some() {
            TrackerState::Loaded
        } else {
            TrackerState::Unloaded
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == TrackerState::Loaded
    }

    /// Time of the last successful refresh
    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.last_update_time
    }

    /// Replace the departure board with a fresh feed response.
    ///
    /// `departures` must already be normalized and in feed order. Every
    /// derived collection is rebuilt from scratch.
    pub fn refresh(&mut self, departures: Vec<Departure>, now: DateTime<Utc>) {
        self.departures_by_route_direction = group_by_route_direction(&departures);
        self.all_route_directions = Some(self.departures_by_route_direction.keys().cloned().collect());
        self.latest_departures = departures;
        self.last_update_time = Some(now);

        debug!(
            stop = %self.stop_number,
            departures = self.latest_departures.len(),
            route_directions = self.departures_by_route_direction.len(),
            "refreshed stop"
        );

        self.recompute_next_notification();
    }

    /// Every route-direction seen in the last refresh, in display order
    pub fn all_route_directions(&self) -> &[RouteDirection] {
        self.all_route_directions.as_deref().unwrap_or_default()
    }

    pub fn untracked_route_directions(&self) -> &BTreeSet<RouteDirection> {
        &self.untracked_route_directions
    }

    pub fn is_tracked(&self, rd: &RouteDirection) -> bool {
        !self.untracked_route_directions.contains(rd)
    }

    /// `all_route_directions` minus the untracked ones, in display order
    pub fn tracked_route_directions(&self) -> Vec<RouteDirection> {
        self.all_route_directions()
            .iter()
            .filter(|rd| self.is_tracked(rd))
            .cloned()
            .collect()
    }

    /// Keep the departures of tracked route-directions.
    ///
    /// Before the first refresh nothing is known about the stop, so every
    /// departure is kept.
    pub fn filter_tracked<'a>(&self, departures: impl IntoIterator<Item = &'a Departure>) -> Vec<Departure> {
        let loaded = self.all_route_directions.is_some();
        departures
            .into_iter()
            .filter(|dep| !loaded || self.is_tracked(&dep.route_direction()))
            .cloned()
            .collect()
    }

    /// Departures of one route-direction from the last refresh, in feed order
    pub fn departures_for(&self, rd: &RouteDirection) -> &[Departure] {
        self.departures_by_route_direction
            .get(rd)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn latest_departures(&self) -> &[Departure] {
        &self.latest_departures
    }

    pub fn untrack(&mut self, rd: RouteDirection) -> bool {
        self.untracked_route_directions.insert(rd)
    }

    pub fn track(&mut self, rd: &RouteDirection) -> bool {
        self.untracked_route_directions.remove(rd)
    }

    /// Replace the whole untracked selection
    pub fn set_untracked(&mut self, untracked: impl IntoIterator<Item = RouteDirection>) {
        self.untracked_route_directions = untracked.into_iter().collect();
    }

    pub fn notification_enabled(&self) -> bool {
        self.notification_enabled
    }

    pub fn notification_lead_minutes(&self) -> u32 {
        self.notification_lead_minutes
    }

    pub fn next_notification_time(&self) -> Option<DateTime<Utc>> {
        self.next_notification_time
    }

    pub fn next_notification_departure(&self) -> Option<&Departure> {
        self.next_notification_departure.as_ref()
    }

    pub fn set_notification(&mut self, lead_minutes: u32) {
        self.notification_enabled = true;
        self.notification_lead_minutes = lead_minutes;
        self.recompute_next_notification();
    }

    pub fn disable_notification(&mut self) {
        self.notification_enabled = false;
    }

    /// Point the stop-level notification at the earliest departure.
    ///
    /// With no departures the previous values are left as they were. A
    /// departure too early to subtract the lead from leaves no fire time.
    pub fn recompute_next_notification(&mut self) {
        let Some(first) = self.latest_departures.first() else {
            return;
        };

        self.next_notification_time = first.minus_lead(self.notification_lead_minutes);
        self.next_notification_departure = Some(first.clone());
    }

    /// First tracked departure, in feed order, at least `lead_minutes` away.
    ///
    /// The comparison is `>=`: a departure exactly `lead_minutes` away still
    /// leaves time to fire the notification.
    pub fn next_tracked_departure_at_or_after_lead(
        &self,
        lead_minutes: u32,
        now: DateTime<Utc>,
    ) -> Option<UpcomingDeparture> {
        self.latest_departures.iter().find_map(|dep| {
            let rd = dep.route_direction();
            if !self.is_tracked(&rd) {
                return None;
            }

            let minutes_until = dep.minutes_until(now);
            if minutes_until < i64::from(lead_minutes) {
                return None;
            }

            Some(UpcomingDeparture {
                minutes_until,
                fire_time: dep.minus_lead(lead_minutes)?,
                departure: dep.clone(),
                route_direction: rd,
            })
        })
    }
}
