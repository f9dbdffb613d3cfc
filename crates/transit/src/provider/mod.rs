//! Transit feed implementations.

pub mod static_provider;

pub use static_provider::{StaticTransitFeed, StopRecord};
