use std::collections::BTreeMap;

use itertools::Itertools;
use nextrip_transit::{Departure, RouteDirection};

/// Group departures into route-direction series.
///
/// Keys are compared by value, so departures from separate feed rows with
/// equal route and direction text land in the same series. Feed order is
/// kept within each series; the map iterates in display order.
pub fn group_by_route_direction(departures: &[Departure]) -> BTreeMap<RouteDirection, Vec<Departure>> {
    departures
        .iter()
        .cloned()
        .into_group_map_by(Departure::route_direction)
        .into_iter()
        .collect()
}
