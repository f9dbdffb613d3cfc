//! In-memory transit feed.
//!
//! Holds a fixed stop catalogue and a departure board per stop. Used for
//! offline demos, tests, and as the stop directory behind "pick a stop near
//! me" lookups.

use std::collections::HashMap;
use std::future::{ready, Future};
use std::pin::Pin;
use std::sync::Arc;

use geo::Point;
use rstar::RTree;

use crate::identifiers::*;
use crate::models::{traits::*, types::*};
use crate::spatial::index::StopNode;
use crate::spatial::queries::{haversine_distance, search_radius_degrees};

#[derive(Clone, Debug, PartialEq)]
pub struct StopRecord {
    pub stop_number: StopNumber,
    pub name: Arc<str>,
    pub location: Option<Point>,
}

impl StopRecord {
    pub fn metadata(&self) -> StopMetadata {
        StopMetadata {
            stop_number: self.stop_number.clone(),
            name: self.name.clone(),
            location: self.location,
        }
    }
}

/// In-memory feed with spatial indexing of stops
///
/// This type is cheap to clone since stop data is stored in `Arc`s.
#[derive(Clone)]
pub struct StaticTransitFeed {
    stops: Vec<Arc<StopRecord>>,
    stop_map: HashMap<StopNumber, Arc<StopRecord>>,
    departures: HashMap<StopNumber, Vec<RawDeparture>>,
    stop_tree: RTree<StopNode>,
}

impl StaticTransitFeed {
    /// Create a new empty feed
    pub fn new() -> Self {
        Self {
            stops: Vec::new(),
            stop_map: HashMap::new(),
            departures: HashMap::new(),
            stop_tree: RTree::new(),
        }
    }

    pub fn from_data(
        stops: Vec<StopRecord>,
        departures: impl IntoIterator<Item = (StopNumber, Vec<RawDeparture>)>,
    ) -> Self {
        let stops: Vec<Arc<StopRecord>> = stops.into_iter().map(Arc::new).collect();

        let stop_map: HashMap<_, _> = stops
            .iter()
            .map(|s| (s.stop_number.clone(), s.clone()))
            .collect();

        let stop_tree = RTree::bulk_load(
            stops
                .iter()
                .filter_map(|s| s.location.map(|loc| StopNode::new(loc, s.clone())))
                .collect(),
        );

        Self {
            stops,
            stop_map,
            departures: departures.into_iter().collect(),
            stop_tree,
        }
    }

    /// Replace the departure board of a stop
    pub fn set_departures(&mut self, stop: StopNumber, departures: Vec<RawDeparture>) {
        self.departures.insert(stop, departures);
    }

    pub fn get_stop(&self, stop: &StopNumber) -> Option<Arc<StopRecord>> {
        self.stop_map.get(stop).cloned()
    }

    pub fn all_stops(&self) -> &[Arc<StopRecord>] {
        &self.stops
    }

    /// Stops within `radius_m` meters of `point`, nearest first
    pub fn stops_near(&self, point: Point, radius_m: f64) -> Vec<Arc<StopRecord>> {
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Vec::new();
        }

        let radius_deg = search_radius_degrees(radius_m, point.y());

        let mut found: Vec<(f64, Arc<StopRecord>)> = self
            .stop_tree
            .locate_within_distance([point.x(), point.y()], radius_deg * radius_deg)
            .filter_map(|node| {
                let location = node.stop.location?;
                let dist = haversine_distance(point, location);
                (dist <= radius_m).then(|| (dist, node.stop.clone()))
            })
            .collect();

        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.into_iter().map(|(_, stop)| stop).collect()
    }

    /// The `n` stops nearest to `point`
    pub fn nearest_stops(&self, point: Point, n: usize) -> Vec<Arc<StopRecord>> {
        self.stop_tree
            .nearest_neighbor_iter(&[point.x(), point.y()])
            .take(n)
            .map(|node| node.stop.clone())
            .collect()
    }

    fn lookup_departures(&self, stop: &StopNumber) -> Result<Vec<RawDeparture>> {
        match self.departures.get(stop) {
            Some(deps) => Ok(deps.clone()),
            None if self.stop_map.contains_key(stop) => Ok(Vec::new()),
            None => Err(TransitError::StopNotFound(stop.clone())),
        }
    }
}

impl Default for StaticTransitFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitFeed for StaticTransitFeed {
    fn departures<'a>(
        &'a self,
        stop: &'a StopNumber,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawDeparture>>> + Send + 'a>> {
        Box::pin(ready(self.lookup_departures(stop)))
    }

    fn stop_metadata<'a>(
        &'a self,
        stop: &'a StopNumber,
    ) -> Pin<Box<dyn Future<Output = Result<StopMetadata>> + Send + 'a>> {
        let result = self
            .stop_map
            .get(stop)
            .map(|s| s.metadata())
            .ok_or_else(|| TransitError::StopNotFound(stop.clone()));
        Box::pin(ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(number: &str, name: &str, lon: f64, lat: f64) -> StopRecord {
        StopRecord {
            stop_number: StopNumber::new(number),
            name: name.into(),
            location: Some(Point::new(lon, lat)),
        }
    }

    fn sample_feed() -> StaticTransitFeed {
        let stops = vec![
            stop("56043", "Snelling Ave & University Ave", -93.1672, 44.9556),
            stop("56044", "Snelling Ave & Dayton Ave", -93.1670, 44.9460),
            stop("17940", "Nicollet Mall Station", -93.2737, 44.9780),
        ];
        let departures = vec![(
            StopNumber::new("56043"),
            vec![RawDeparture {
                route: RouteIdentifier::new("84"),
                direction: DirectionName::new("NORTHBOUND"),
                departure_time: RawTime::EpochMillis(1_700_000_000_000),
            }],
        )];
        StaticTransitFeed::from_data(stops, departures)
    }

    #[test]
    fn test_empty_feed() {
        let feed = StaticTransitFeed::new();
        assert!(feed.all_stops().is_empty());
        assert!(feed.nearest_stops(Point::new(-93.0, 45.0), 3).is_empty());
    }

    #[test]
    fn test_stops_near() {
        let feed = sample_feed();
        let here = Point::new(-93.1671, 44.9550);

        let near = feed.stops_near(here, 300.0);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].stop_number, StopNumber::new("56043"));

        let wider = feed.stops_near(here, 2_000.0);
        let numbers: Vec<&str> = wider.iter().map(|s| s.stop_number.as_str()).collect();
        assert_eq!(numbers, vec!["56043", "56044"]);

        assert!(feed.stops_near(here, -1.0).is_empty());
    }

    #[test]
    fn test_nearest_stops() {
        let feed = sample_feed();
        let downtown = Point::new(-93.2700, 44.9770);

        let nearest = feed.nearest_stops(downtown, 1);
        assert_eq!(nearest[0].stop_number, StopNumber::new("17940"));
    }

    #[tokio::test]
    async fn test_feed_lookups() {
        let feed = sample_feed();

        let deps = feed.departures(&StopNumber::new("56043")).await.unwrap();
        assert_eq!(deps.len(), 1);

        // Known stop without a board is an empty answer, not an error
        let deps = feed.departures(&StopNumber::new("17940")).await.unwrap();
        assert!(deps.is_empty());

        let meta = feed.stop_metadata(&StopNumber::new("17940")).await.unwrap();
        assert_eq!(&*meta.name, "Nicollet Mall Station");

        assert!(matches!(
            feed.departures(&StopNumber::new("1")).await,
            Err(TransitError::StopNotFound(_))
        ));
        assert!(feed.stop_metadata(&StopNumber::new("1")).await.is_err());
    }
}
