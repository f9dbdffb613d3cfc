//! Spatial indexing of stop locations.

pub mod index;
pub mod queries;

pub use queries::haversine_distance;
