//! R-tree nodes for stop lookups.
//!
//! Stops are indexed by `[lon, lat]` in degrees. The tree only prunes
//! candidates with Euclidean distance; final results are filtered with the
//! Haversine distance in [`super::queries`].

use std::sync::Arc;

use geo::Point;
use rstar::{PointDistance, RTreeObject, AABB};

use crate::provider::static_provider::StopRecord;

#[derive(Clone)]
pub struct StopNode {
    pub stop: Arc<StopRecord>,
    point: [f64; 2],
}

impl StopNode {
    pub fn new(location: Point, stop: Arc<StopRecord>) -> Self {
        Self {
            stop,
            point: [location.x(), location.y()],
        }
    }
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}
