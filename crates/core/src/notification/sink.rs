use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::notification::{NotificationId, NotificationRequest};

/// Delivery side of notifications.
///
/// Platform adapters implement this. `schedule` is called with the current
/// state of a request after every resync, so implementations should replace
/// any alert previously scheduled under the same [`NotificationId`].
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, request: &NotificationRequest);
    fn cancel(&self, id: NotificationId);
}

/// Sink that logs scheduled notifications instead of delivering them
#[derive(Debug, Default)]
pub struct TracingSink {
    scheduled: Mutex<HashMap<NotificationId, DateTime<Utc>>>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationSink for TracingSink {
    fn schedule(&self, request: &NotificationRequest) {
        let (Some(fire_time), Some(content)) = (request.fire_time, request.content.as_deref()) else {
            debug!(id = %request.id, stop = %request.stop, "notification has no departure yet");
            return;
        };

        let mut scheduled = match self.scheduled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Only log when the fire time moves
        if scheduled.insert(request.id, fire_time) != Some(fire_time) {
            info!(
                id = %request.id,
                stop = %request.stop,
                fire_time = %fire_time,
                "{content}"
            );
        }
    }

    fn cancel(&self, id: NotificationId) {
        let mut scheduled = match self.scheduled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if scheduled.remove(&id).is_some() {
            info!(id = %id, "notification cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nextrip_transit::StopNumber;

    fn request(id: u64, fire_secs: Option<i64>) -> NotificationRequest {
        NotificationRequest {
            id: NotificationId(id),
            stop: StopNumber::new("100"),
            lead_minutes: 5,
            fire_time: fire_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            content: fire_secs.map(|_| "21 WESTBOUND is departing in 8 minute(s)".to_string()),
        }
    }

    #[test]
    fn test_tracks_scheduled_fire_times() {
        let sink = TracingSink::new();

        sink.schedule(&request(0, None));
        assert!(sink.scheduled.lock().unwrap().is_empty());

        sink.schedule(&request(0, Some(1_700_000_000)));
        sink.schedule(&request(0, Some(1_700_000_060)));
        let scheduled = sink.scheduled.lock().unwrap().clone();
        assert_eq!(
            scheduled.get(&NotificationId(0)),
            Some(&Utc.timestamp_opt(1_700_000_060, 0).unwrap())
        );

        sink.cancel(NotificationId(0));
        assert!(sink.scheduled.lock().unwrap().is_empty());
    }
}
