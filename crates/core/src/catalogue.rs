//! Offline stop catalogue for "which stops are near me" lookups.
//!
//! The catalogue is a JSON array of stop lookup records, the same shape the
//! stop lookup endpoint answers with, indexed by a [`StaticTransitFeed`].

use std::iter;
use std::path::Path;
use std::sync::Arc;

use api_types::StopInfo;
use geo::Point;
use nextrip_transit::{Result, StaticTransitFeed, StopNumber, StopRecord, TransitError};
use tracing::info;

fn stop_record(info: StopInfo) -> StopRecord {
    let location = match (info.stop_lon, info.stop_lat) {
        (Some(lon), Some(lat)) => Some(Point::new(lon, lat)),
        _ => None,
    };

    StopRecord {
        stop_number: StopNumber::new(info.stop_id.to_string()),
        name: info.stop_name.into(),
        location,
    }
}

pub fn parse_catalogue(bytes: &[u8]) -> Result<StaticTransitFeed> {
    let stops: Vec<StopInfo> = serde_json::from_slice(bytes)
        .map_err(|e| TransitError::SerializationError(e.to_string()))?;

    Ok(StaticTransitFeed::from_data(
        stops.into_iter().map(stop_record).collect(),
        iter::empty(),
    ))
}

pub async fn load_catalogue(path: &Path) -> Result<StaticTransitFeed> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| TransitError::Storage(format!("{}: {e}", path.display())))?;
    let catalogue = parse_catalogue(&bytes)?;

    info!(
        path = %path.display(),
        stops = catalogue.all_stops().len(),
        "loaded stop catalogue"
    );
    Ok(catalogue)
}

/// Up to `limit` stops around `point`, nearest first.
///
/// With a radius only stops within `radius_m` meters count; without one the
/// `limit` nearest stops are returned however far away they are.
pub fn stops_around(
    catalogue: &StaticTransitFeed,
    point: Point,
    radius_m: Option<f64>,
    limit: usize,
) -> Vec<Arc<StopRecord>> {
    match radius_m {
        Some(radius_m) => {
            let mut stops = catalogue.stops_near(point, radius_m);
            stops.truncate(limit);
            stops
        }
        None => catalogue.nearest_stops(point, limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOGUE: &str = r#"[
        {"stop_id": 56043, "stop_name": "Snelling Ave & University Ave", "stop_lat": 44.9556, "stop_lon": -93.1672},
        {"stop_id": 56044, "stop_name": "Snelling Ave & Sherburne Ave", "stop_lat": 44.9578, "stop_lon": -93.1671},
        {"stop_id": "17940", "stop_name": "Nicollet Mall & 5th St", "stop_lat": 44.9780, "stop_lon": -93.2710},
        {"stop_id": 1, "stop_name": "Unmapped"}
    ]"#;

    fn numbers(stops: &[Arc<StopRecord>]) -> Vec<&str> {
        stops.iter().map(|s| s.stop_number.as_str()).collect()
    }

    #[test]
    fn test_parse_catalogue() {
        let catalogue = parse_catalogue(CATALOGUE.as_bytes()).unwrap();

        assert_eq!(catalogue.all_stops().len(), 4);
        let stop = catalogue.get_stop(&StopNumber::new("17940")).unwrap();
        assert_eq!(&*stop.name, "Nicollet Mall & 5th St");
        assert_eq!(catalogue.get_stop(&StopNumber::new("1")).unwrap().location, None);
    }

    #[test]
    fn test_parse_catalogue_rejects_malformed_json() {
        assert!(matches!(
            parse_catalogue(b"{\"stop_id\": 1}"),
            Err(TransitError::SerializationError(_))
        ));
    }

    #[test]
    fn test_stops_around_with_radius() {
        let catalogue = parse_catalogue(CATALOGUE.as_bytes()).unwrap();
        let here = Point::new(-93.1672, 44.9560);

        let near = stops_around(&catalogue, here, Some(500.0), 10);
        assert_eq!(numbers(&near), vec!["56043", "56044"]);

        let limited = stops_around(&catalogue, here, Some(500.0), 1);
        assert_eq!(numbers(&limited), vec!["56043"]);
    }

    #[test]
    fn test_stops_around_without_radius() {
        let catalogue = parse_catalogue(CATALOGUE.as_bytes()).unwrap();
        let downtown = Point::new(-93.2700, 44.9775);

        let nearest = stops_around(&catalogue, downtown, None, 2);
        assert_eq!(numbers(&nearest), vec!["17940", "56044"]);
    }

    #[tokio::test]
    async fn test_load_catalogue_missing_file() {
        let path = std::env::temp_dir().join("nextrip-no-such-catalogue.json");
        assert!(matches!(
            load_catalogue(&path).await,
            Err(TransitError::Storage(_))
        ));
    }
}
