//! Parameterized recommendation queries and the graph-view queries.
//!
//! Every value interpolated into query text is validated first: numbers must
//! be finite and track ids must be plain identifier fragments.

mod view;

pub use view::{artist_graph, flatten_rows, genre_graph, Edge, GraphView, Node, NodeType, Row};

use lazy_static::lazy_static;

use crate::error::ValidationError;
use crate::graph::{is_local_name_fragment, NAMESPACE};

lazy_static! {
    static ref PREFIX: String = format!("PREFIX : <{}>", NAMESPACE);
}

pub const PARTY_TRACKS_LIMIT: usize = 50;
pub const SIMILAR_LIMIT: usize = 25;
pub const GENRE_RECS_LIMIT: usize = 30;

/// Seed used by genre-recs when no liked tracks are given.
pub const DEFAULT_LIKED_TRACK: &str = "track_1";

/// Parses an optional numeric parameter, falling back to `default` when absent.
pub fn parse_number(name: &str, raw: Option<&str>, default: f64) -> Result<f64, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::new(format!(
            "{} must be a finite number, got {:?}",
            name, raw
        ))),
    }
}

/// Checks that `value` can be used verbatim as a local name in query text.
pub fn validate_track_id<'a>(name: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    if is_local_name_fragment(value) {
        Ok(value)
    } else {
        Err(ValidationError::new(format!(
            "{} must only contain letters, digits and underscores, got {:?}",
            name, value
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartyTracksParams {
    pub min_energy: f64,
    pub min_dance: f64,
    pub min_tempo: f64,
}

impl Default for PartyTracksParams {
    fn default() -> Self {
        Self {
            min_energy: 0.8,
            min_dance: 0.7,
            min_tempo: 120.0,
        }
    }
}

impl PartyTracksParams {
    pub fn parse(
        min_energy: Option<&str>,
        min_dance: Option<&str>,
        min_tempo: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let defaults = Self::default();
        Ok(Self {
            min_energy: parse_number("minEnergy", min_energy, defaults.min_energy)?,
            min_dance: parse_number("minDance", min_dance, defaults.min_dance)?,
            min_tempo: parse_number("minTempo", min_tempo, defaults.min_tempo)?,
        })
    }

    /// Tracks with `energy > minEnergy`, `danceability > minDance` and
    /// `tempo >= minTempo`, most energetic first.
    pub fn render(&self) -> String {
        format!(
            "{prefix}
SELECT ?track ?title ?artistName ?tempo ?energy ?dance WHERE {{
  ?track a :Track ; :title ?title ; :performedBy ?a ; :hasFeature ?f .
  ?a :name ?artistName .
  ?f :energy ?energy ; :danceability ?dance ; :tempo ?tempo .
  FILTER(?energy > {energy} && ?dance > {dance} && ?tempo >= {tempo})
}} ORDER BY DESC(?energy) DESC(?dance) LIMIT {limit}
",
            prefix = *PREFIX,
            energy = self.min_energy,
            dance = self.min_dance,
            tempo = self.min_tempo,
            limit = PARTY_TRACKS_LIMIT,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarParams {
    pub seed_id: String,
    /// Per-axis threshold for energy and danceability.
    pub max_feature_delta: f64,
    /// Threshold for tempo, in BPM.
    pub max_tempo_delta: f64,
}

impl SimilarParams {
    pub fn parse(
        seed_id: Option<&str>,
        d: Option<&str>,
        t: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let seed_id = seed_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ValidationError::new("seedId is required"))?;
        Ok(Self {
            seed_id: validate_track_id("seedId", seed_id)?.to_string(),
            max_feature_delta: parse_number("d", d, 0.1)?,
            max_tempo_delta: parse_number("t", t, 5.0)?,
        })
    }

    /// Tracks whose features are each within the thresholds of the seed's,
    /// excluding the seed.
    pub fn render(&self) -> String {
        format!(
            "{prefix}
SELECT ?rec ?title ?artistName WHERE {{
  :{seed} :hasFeature ?sf .
  ?sf :energy ?se ; :danceability ?sd ; :tempo ?st .
  ?rec a :Track ; :title ?title ; :performedBy ?a ; :hasFeature ?f .
  ?a :name ?artistName .
  ?f :energy ?e2 ; :danceability ?d2 ; :tempo ?t2 .
  FILTER(?rec != :{seed})
  FILTER(ABS(?e2 - ?se) < {d} && ABS(?d2 - ?sd) < {d} && ABS(?t2 - ?st) < {t})
}} LIMIT {limit}
",
            prefix = *PREFIX,
            seed = self.seed_id,
            d = self.max_feature_delta,
            t = self.max_tempo_delta,
            limit = SIMILAR_LIMIT,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenreRecsParams {
    pub liked: Vec<String>,
}

impl GenreRecsParams {
    /// An empty list falls back to `DEFAULT_LIKED_TRACK`.
    pub fn parse(liked: Vec<String>) -> Result<Self, ValidationError> {
        if liked.is_empty() {
            return Ok(Self {
                liked: vec![DEFAULT_LIKED_TRACK.to_string()],
            });
        }
        for id in &liked {
            validate_track_id("liked", id)?;
        }
        Ok(Self { liked })
    }

    /// Tracks sharing a genre with any liked track, with that genre, never
    /// returning a liked track.
    pub fn render(&self) -> String {
        let values = self
            .liked
            .iter()
            .map(|id| format!(":{}", id))
            .collect::<Vec<_>>();
        format!(
            "{prefix}
SELECT DISTINCT ?rec ?title ?becauseGenre WHERE {{
  VALUES ?liked {{ {values} }}
  ?liked :hasGenre ?becauseGenre .
  ?rec a :Track ; :title ?title ; :hasGenre ?becauseGenre .
  FILTER(?rec NOT IN ({excluded}))
}} LIMIT {limit}
",
            prefix = *PREFIX,
            values = values.join(" "),
            excluded = values.join(", "),
            limit = GENRE_RECS_LIMIT,
        )
    }
}

/// Track to genre relationships, with the genre's display label when known.
pub fn genre_graph_query() -> String {
    format!(
        "{}
SELECT ?track ?title ?genre ?genreLabel WHERE {{
  ?track a :Track ; :title ?title ; :hasGenre ?genre .
  OPTIONAL {{ ?genre :label ?genreLabel }}
}}
",
        *PREFIX
    )
}

/// Every artist with its genres and tracks.
pub fn artist_graph_query() -> String {
    format!(
        "{}
SELECT ?artist ?artistName ?genre ?genreLabel ?track ?trackName WHERE {{
  ?artist a :Artist ; :name ?artistName .
  OPTIONAL {{
    ?artist :hasGenre ?genre .
    OPTIONAL {{ ?genre :label ?genreLabel }}
  }}
  OPTIONAL {{ ?track :performedBy ?artist ; :title ?trackName . }}
}}
",
        *PREFIX
    )
}
