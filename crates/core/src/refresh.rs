//! Periodic refresh of every stop on a shared board.
//!
//! Fetches run concurrently and without holding the board lock. Each
//! completion is applied under the write lock as soon as it arrives, so when
//! two refreshes of the same stop overlap, the one that finishes last wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{FuturesUnordered, StreamExt};
use nextrip_transit::TransitFeed;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::error::BoardError;
use crate::notification::NotificationSink;

pub type SharedBoard = Arc<RwLock<Board>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
    /// Stops closed while their fetch was in flight
    pub dropped: usize,
}

/// Refresh every stop once and push resynced notifications to `sink`
pub async fn refresh_all(
    board: &RwLock<Board>,
    feed: &dyn TransitFeed,
    sink: &dyn NotificationSink,
) -> RefreshSummary {
    let stops = board.read().await.stop_numbers();

    let mut pending: FuturesUnordered<_> = stops
        .iter()
        .map(|stop| async move { (stop, feed.departures(stop).await) })
        .collect();

    let mut summary = RefreshSummary::default();
    while let Some((stop, result)) = pending.next().await {
        let mut board = board.write().await;
        match board.apply_departures(stop, result, Utc::now()) {
            Ok(_) => {
                summary.refreshed += 1;
                for request in board.scheduler().requests_for(stop) {
                    sink.schedule(request);
                }
            }
            Err(BoardError::UnknownStop(_)) => {
                debug!(stop = %stop, "stop closed before its refresh completed");
                summary.dropped += 1;
            }
            Err(BoardError::Feed { .. }) => summary.failed += 1,
        }
    }

    summary
}

/// Resolve the display name of every stop still showing "Loading..."
pub async fn resolve_pending_names(board: &RwLock<Board>, feed: &dyn TransitFeed) {
    let stops = board.read().await.unnamed_stops();

    let mut pending: FuturesUnordered<_> = stops
        .iter()
        .map(|stop| async move { (stop, feed.stop_metadata(stop).await) })
        .collect();

    while let Some((stop, result)) = pending.next().await {
        match board.write().await.apply_stop_metadata(stop, result) {
            Ok(()) => {}
            Err(BoardError::UnknownStop(_)) => {
                debug!(stop = %stop, "stop closed before its name resolved");
            }
            Err(error) => warn!(stop = %stop, error = %error, "failed to apply stop name"),
        }
    }
}

/// Refresh the board every `period` until `shutdown` fires.
///
/// Each tick runs in its own task so a slow feed never delays the timer.
pub async fn run_refresh_loop(
    board: SharedBoard,
    feed: Arc<dyn TransitFeed>,
    sink: Arc<dyn NotificationSink>,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!(period_secs = period.as_secs_f64(), "starting refresh loop");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                while in_flight.try_join_next().is_some() {}

                let board = board.clone();
                let feed = feed.clone();
                let sink = sink.clone();
                in_flight.spawn(async move {
                    resolve_pending_names(&board, feed.as_ref()).await;
                    let summary = refresh_all(&board, feed.as_ref(), sink.as_ref()).await;
                    debug!(
                        refreshed = summary.refreshed,
                        failed = summary.failed,
                        dropped = summary.dropped,
                        "refresh tick complete"
                    );
                });
            }
        }
    }

    in_flight.shutdown().await;
    info!("refresh loop stopped");
}
