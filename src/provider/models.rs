//! Provider catalog API models and the entities the import works on.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::graph::is_local_name_fragment;

/// One page of `GET /me/tracks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedTracksPage {
    #[serde(default)]
    pub items: Vec<Option<SavedTrackItem>>,
    /// URL of the next page, absent on the last one.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedTrackItem {
    #[serde(default)]
    pub track: Option<ProviderTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTrack {
    /// Null for local files.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ProviderArtistRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesResponse {
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    pub tempo: f64,
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistsResponse {
    #[serde(default)]
    pub artists: Vec<Option<ProviderArtist>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderArtist {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

/// A saved track as the graph sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    /// The primary artist, when the provider gave it an id.
    pub artist: Option<Artist>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

impl SavedTrackItem {
    /// Converts the item into a `Track`, dropping placeholders without a
    /// track or a track id.
    ///
    /// Ids that cannot be written as local names are dropped with a warning:
    /// the whole track for a bad track id, only the artist for a bad artist id.
    pub fn into_track(self) -> Option<Track> {
        let track = self.track?;
        let id = track.id.filter(|id| !id.is_empty())?;
        if !is_local_name_fragment(&id) {
            warn!("Skipping saved track with unusable id {:?}", id);
            return None;
        }
        let artist = track.artists.into_iter().next().and_then(|a| {
            let id = a.id.filter(|id| !id.is_empty())?;
            if !is_local_name_fragment(&id) {
                warn!("Ignoring artist with unusable id {:?}", id);
                return None;
            }
            Some(Artist { id, name: a.name })
        });
        Some(Track {
            id,
            title: track.name,
            artist,
        })
    }
}
