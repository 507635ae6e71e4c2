//! Paginated retrieval of the user's saved tracks.

use std::sync::Arc;
use tracing::{debug, info};

use super::client::{CatalogApi, ProviderError};
use super::models::{SavedTrackItem, Track};

/// Items requested per page.
pub const PAGE_SIZE: usize = 50;

pub struct LibraryFetcher {
    api: Arc<dyn CatalogApi>,
}

impl LibraryFetcher {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }

    /// Fetches up to `max_tracks` saved tracks, page by page from offset 0.
    ///
    /// Stops as soon as the bound is reached or the provider reports no next
    /// page, or returns a page without items. Any failed page aborts the
    /// whole fetch.
    pub async fn fetch_saved_tracks(&self, max_tracks: usize) -> Result<Vec<Track>, ProviderError> {
        let mut tracks = Vec::new();
        let mut offset = 0;

        while tracks.len() < max_tracks {
            let page = self.api.saved_tracks_page(offset, PAGE_SIZE).await?;
            let received = page.items.len();
            tracks.extend(
                page.items
                    .into_iter()
                    .flatten()
                    .filter_map(SavedTrackItem::into_track),
            );
            debug!(
                "Fetched saved tracks page at offset {} ({} items, {} usable so far)",
                offset,
                received,
                tracks.len()
            );

            // An empty page ends the fetch even if the provider still links a next one
            if received == 0 || page.next.is_none() {
                break;
            }
            offset += PAGE_SIZE;
        }

        tracks.truncate(max_tracks);
        info!("Fetched {} saved tracks", tracks.len());
        Ok(tracks)
    }
}
