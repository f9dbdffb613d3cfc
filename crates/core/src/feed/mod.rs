//! Feed adapters for live departure sources.

mod http;
mod nextrip;

pub use http::HttpFetcher;
pub use nextrip::NexTripFeed;
