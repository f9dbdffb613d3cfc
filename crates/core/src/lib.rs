//! Stop tracking and departure notification scheduling.
//!
//! A [`Board`] owns the stops the user is watching. Each refresh feeds a
//! stop's departures through its [`StopTracker`], and the board's
//! [`NotificationScheduler`] then recomputes when each recurring
//! notification for that stop should fire.

pub mod board;
pub mod bookmarks;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod feed;
pub mod notification;
pub mod refresh;
pub mod storage;
pub mod tracker;

pub use board::Board;
pub use error::BoardError;
pub use notification::{NotificationRequest, NotificationScheduler, NotificationSink};
pub use tracker::{StopName, StopTracker, UpcomingDeparture};

// Re-export transit from the transit crate
pub use nextrip_transit as transit;
