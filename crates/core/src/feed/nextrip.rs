//! Metro Transit NexTrip adapter.

use std::future::Future;
use std::pin::Pin;

use api_types::{NexTripDeparture, StopInfo};
use geo::Point;
use nextrip_transit::{
    DataFetcher, DirectionName, RawDeparture, RawTime, Result, RouteIdentifier, StopMetadata,
    StopNumber, TransitError, TransitFeed,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::FeedConfig;

/// Placeholder for the stop number in URL templates
const STOP_PLACEHOLDER: &str = "{stop}";

/// [`TransitFeed`] speaking the NexTrip JSON format over any [`DataFetcher`]
pub struct NexTripFeed<F> {
    fetcher: F,
    departures_url: String,
    stop_url: Option<String>,
}

impl<F: DataFetcher> NexTripFeed<F> {
    pub fn new(fetcher: F, config: &FeedConfig) -> Self {
        Self {
            fetcher,
            departures_url: config.departures_url.clone(),
            stop_url: config.stop_url.clone(),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "fetching");
        let bytes = self.fetcher.fetch(url).await?;
        serde_json::from_slice(&bytes).map_err(|e| TransitError::SerializationError(e.to_string()))
    }
}

fn expand(template: &str, stop: &StopNumber) -> String {
    template.replace(STOP_PLACEHOLDER, stop.as_str())
}

fn raw_departure(dep: NexTripDeparture) -> RawDeparture {
    RawDeparture {
        route: RouteIdentifier::new(dep.route),
        direction: DirectionName::new(dep.route_direction),
        departure_time: RawTime::Text(dep.departure_time),
    }
}

/// Lookups answering with another stop's record are rejected
fn stop_metadata(stop: &StopNumber, info: StopInfo) -> Result<StopMetadata> {
    if info.stop_id.to_string() != stop.as_str() {
        return Err(TransitError::InvalidData(format!(
            "lookup for stop {stop} returned stop {}",
            info.stop_id
        )));
    }

    let location = match (info.stop_lon, info.stop_lat) {
        (Some(lon), Some(lat)) => Some(Point::new(lon, lat)),
        _ => None,
    };

    Ok(StopMetadata {
        stop_number: stop.clone(),
        name: info.stop_name.into(),
        location,
    })
}

impl<F: DataFetcher> TransitFeed for NexTripFeed<F> {
    fn departures<'a>(
        &'a self,
        stop: &'a StopNumber,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawDeparture>>> + Send + 'a>> {
        Box::pin(async move {
            let rows: Vec<NexTripDeparture> = self.fetch_json(&expand(&self.departures_url, stop)).await?;
            Ok(rows.into_iter().map(raw_departure).collect())
        })
    }

    fn stop_metadata<'a>(
        &'a self,
        stop: &'a StopNumber,
    ) -> Pin<Box<dyn Future<Output = Result<StopMetadata>> + Send + 'a>> {
        Box::pin(async move {
            let template = self.stop_url.as_deref().ok_or_else(|| {
                TransitError::InvalidData("no stop lookup URL configured".into())
            })?;
            let info: StopInfo = self.fetch_json(&expand(template, stop)).await?;
            stop_metadata(stop, info)
        })
    }
}
