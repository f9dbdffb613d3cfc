//! Wire types for the Metro Transit NexTrip JSON API.
//!
//! Only the fields the tracker reads are required; everything else is
//! optional so that upstream additions do not break decoding.

use serde::{Deserialize, Serialize};

/// One row of `GET /NexTrip/{stop}?format=json`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NexTripDeparture {
    pub route: String,
    pub route_direction: String,
    /// Microsoft JSON date, e.g. `/Date(1510000000000-0600)/`
    pub departure_time: String,
    #[serde(default)]
    pub departure_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `true` when the time comes from a tracked vehicle rather than the schedule
    #[serde(default)]
    pub actual: bool,
    #[serde(default)]
    pub block_number: Option<u32>,
    #[serde(default)]
    pub terminal: Option<String>,
}

/// Stop lookup response, in GTFS `stops.txt` naming
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopInfo {
    pub stop_id: StopId,
    pub stop_name: String,
    #[serde(default)]
    pub stop_lat: Option<f64>,
    #[serde(default)]
    pub stop_lon: Option<f64>,
}

/// Stop ids arrive as numbers from some endpoints and strings from others
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for StopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopId::Number(n) => write!(f, "{n}"),
            StopId::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nextrip_departures() {
        let body = r#"[
            {
                "Actual": true,
                "BlockNumber": 1045,
                "DepartureText": "5 Min",
                "DepartureTime": "/Date(1510000300000-0600)/",
                "Description": "Uptown / Lake St",
                "Gate": "",
                "Route": "21",
                "RouteDirection": "WESTBOUND",
                "Terminal": "A",
                "VehicleHeading": 0,
                "VehicleLatitude": 44.9481,
                "VehicleLongitude": -93.1664
            },
            {
                "DepartureTime": "/Date(1510000900000-0600)/",
                "Route": "84",
                "RouteDirection": "NORTHBOUND"
            }
        ]"#;

        let deps: Vec<NexTripDeparture> = serde_json::from_str(body).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].route, "21");
        assert_eq!(deps[0].route_direction, "WESTBOUND");
        assert!(deps[0].actual);
        assert_eq!(deps[0].departure_text.as_deref(), Some("5 Min"));
        assert!(!deps[1].actual);
        assert_eq!(deps[1].terminal, None);
    }

    #[test]
    fn test_decode_stop_info() {
        let numeric: StopInfo = serde_json::from_str(
            r#"{"stop_id": 56043, "stop_name": "Snelling Ave & University Ave", "stop_lat": 44.9556, "stop_lon": -93.1672}"#,
        )
        .unwrap();
        assert_eq!(numeric.stop_id.to_string(), "56043");
        assert_eq!(numeric.stop_lat, Some(44.9556));

        let text: StopInfo =
            serde_json::from_str(r#"{"stop_id": "MAAM", "stop_name": "Mall of America"}"#).unwrap();
        assert_eq!(text.stop_id, StopId::Text("MAAM".into()));
        assert_eq!(text.stop_lon, None);
    }
}
