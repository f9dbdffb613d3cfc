//! Bookmarked stops, persisted through a [`StorageLoader`].

use nextrip_transit::{Result, StopMetadata, StopNumber, StorageLoader, TransitError};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const BOOKMARKS_KEY: &str = "saved-stops.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub stop_id: StopNumber,
    pub stop_name: String,
    #[serde(default)]
    pub stop_lat: Option<f64>,
    #[serde(default)]
    pub stop_lon: Option<f64>,
}

impl From<&StopMetadata> for Bookmark {
    fn from(meta: &StopMetadata) -> Self {
        Self {
            stop_id: meta.stop_number.clone(),
            stop_name: meta.name.to_string(),
            stop_lat: meta.location.map(|p| p.y()),
            stop_lon: meta.location.map(|p| p.x()),
        }
    }
}

pub struct BookmarkStore<S> {
    storage: S,
}

impl<S: StorageLoader> BookmarkStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// All bookmarks; a store that was never written starts out empty.
    pub async fn load(&self) -> Result<Vec<Bookmark>> {
        if !self.storage.exists(BOOKMARKS_KEY).await {
            debug!("initializing empty bookmark store");
            self.save(&[]).await?;
            return Ok(Vec::new());
        }

        let bytes = self.storage.load(BOOKMARKS_KEY).await?;
        serde_json::from_slice(&bytes).map_err(|e| TransitError::SerializationError(e.to_string()))
    }

    /// Append bookmarks, skipping stops that are already saved
    pub async fn add(&self, bookmarks: impl IntoIterator<Item = Bookmark>) -> Result<Vec<Bookmark>> {
        let mut saved = self.load().await?;
        for bookmark in bookmarks {
            if !saved.iter().any(|b| b.stop_id == bookmark.stop_id) {
                saved.push(bookmark);
            }
        }
        self.save(&saved).await?;
        Ok(saved)
    }

    pub async fn remove(&self, stop: &StopNumber) -> Result<Vec<Bookmark>> {
        let mut saved = self.load().await?;
        saved.retain(|b| &b.stop_id != stop);
        self.save(&saved).await?;
        Ok(saved)
    }

    async fn save(&self, bookmarks: &[Bookmark]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(bookmarks)
            .map_err(|e| TransitError::SerializationError(e.to_string()))?;
        self.storage.save(BOOKMARKS_KEY, &bytes).await
    }
}
