//! Chunked batch lookups of audio features and artist genres.
//!
//! Chunks are independent requests and run with bounded concurrency. The two
//! lookups differ in failure policy: a failed audio-features chunk is logged
//! and skipped, so the tracks in it simply have no features, while a failed
//! artist chunk fails the whole enrichment once every sibling chunk has
//! completed.

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use super::client::{CatalogApi, ProviderError};
use super::models::{AudioFeatures, Track};

/// Provider cap on ids per `/audio-features` call.
pub const FEATURES_CHUNK_SIZE: usize = 10;
/// Provider cap on ids per `/artists` call.
pub const ARTISTS_CHUNK_SIZE: usize = 50;

/// Lookup results for one import run.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub features_by_id: HashMap<String, AudioFeatures>,
    pub genres_by_artist: HashMap<String, Vec<String>>,
}

pub struct FeatureEnricher {
    api: Arc<dyn CatalogApi>,
    concurrency: usize,
}

impl FeatureEnricher {
    pub fn new(api: Arc<dyn CatalogApi>, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
        }
    }

    /// Looks up genres for the tracks' primary artists, then audio features
    /// for the tracks themselves.
    pub async fn enrich(&self, tracks: &[Track]) -> Result<Enrichment, ProviderError> {
        let artist_ids: Vec<String> = tracks
            .iter()
            .filter_map(|t| t.artist.as_ref().map(|a| a.id.clone()))
            .collect();
        let genres_by_artist = self.fetch_artist_genres(&artist_ids).await?;

        let track_ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
        let features_by_id = self.fetch_audio_features(&track_ids).await;

        Ok(Enrichment {
            features_by_id,
            genres_by_artist,
        })
    }

    /// Returns features for every id the provider answered for. Entries are
    /// keyed by the id the provider reported, not by request position.
    pub async fn fetch_audio_features(&self, ids: &[String]) -> HashMap<String, AudioFeatures> {
        let chunks: Vec<Vec<String>> = ids
            .chunks(FEATURES_CHUNK_SIZE)
            .map(|c| c.to_vec())
            .collect();

        let results: Vec<_> = stream::iter(chunks)
            .map(|chunk| async move {
                let result = self.api.audio_features(&chunk).await;
                (chunk, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut features = HashMap::new();
        for (chunk, result) in results {
            match result {
                Ok(entries) => {
                    for entry in entries.into_iter().flatten() {
                        features.insert(entry.id.clone(), entry);
                    }
                }
                Err(e) => warn!(
                    "Skipping audio features for {} tracks ({}): {}",
                    chunk.len(),
                    chunk.join(","),
                    e
                ),
            }
        }
        debug!("Audio features found for {}/{} tracks", features.len(), ids.len());
        features
    }

    /// Returns the genre labels of every requested artist, keyed by artist id.
    /// Artists the provider reports no genres for map to an empty list.
    pub async fn fetch_artist_genres(
        &self,
        artist_ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>, ProviderError> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = artist_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let chunks: Vec<Vec<String>> = unique
            .chunks(ARTISTS_CHUNK_SIZE)
            .map(|c| c.to_vec())
            .collect();

        let mut results: Vec<_> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move { (index, self.api.artists(&chunk).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        results.sort_by_key(|(index, _)| *index);

        let mut genres = HashMap::new();
        for (_, result) in results {
            for artist in result?.into_iter().flatten() {
                genres.insert(artist.id, artist.genres.unwrap_or_default());
            }
        }
        debug!("Genres resolved for {} artists", genres.len());
        Ok(genres)
    }
}
