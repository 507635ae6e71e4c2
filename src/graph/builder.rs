//! Builds the deduplicated fact set of one import run.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::term::{Class, Fact, LocalName, Predicate, Term};
use crate::provider::models::{AudioFeatures, Track};

/// Node counts of a built graph, by class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub tracks: usize,
    pub artists: usize,
    pub genres: usize,
    pub audio_features: usize,
}

/// Facts in emission order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub facts: Vec<Fact>,
    pub stats: GraphStats,
}

/// Accumulates facts, emitting the node facts of each identifier only once.
#[derive(Default)]
pub struct GraphBuilder {
    facts: Vec<Fact>,
    seen: HashSet<LocalName>,
    stats: GraphStats,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph for `tracks` in input order.
    ///
    /// Tracks without a primary artist get no artist or genre facts. Tracks
    /// without an entry in `features_by_id` get no feature node.
    pub fn build(
        mut self,
        tracks: &[Track],
        features_by_id: &HashMap<String, AudioFeatures>,
        genres_by_artist: &HashMap<String, Vec<String>>,
    ) -> Graph {
        for track in tracks {
            self.add_track(track, features_by_id, genres_by_artist);
        }
        Graph {
            facts: self.facts,
            stats: self.stats,
        }
    }

    fn add_track(
        &mut self,
        track: &Track,
        features_by_id: &HashMap<String, AudioFeatures>,
        genres_by_artist: &HashMap<String, Vec<String>>,
    ) {
        let track_node = LocalName::track(&track.id);
        if self.first_sighting(&track_node) {
            self.stats.tracks += 1;
            self.node(&track_node, Class::Track);
            self.push(&track_node, Predicate::Title, Term::Text(track.title.clone()));
        }

        if let Some(artist) = &track.artist {
            let genres = genre_nodes(genres_by_artist.get(&artist.id));

            let artist_node = LocalName::artist(&artist.id);
            if self.first_sighting(&artist_node) {
                self.stats.artists += 1;
                self.node(&artist_node, Class::Artist);
                self.push(&artist_node, Predicate::Name, Term::Text(artist.name.clone()));
                for (genre_node, _) in &genres {
                    self.push(&artist_node, Predicate::HasGenre, Term::Node(genre_node.clone()));
                }
            }
            self.push(&track_node, Predicate::PerformedBy, Term::Node(artist_node));

            for (genre_node, label) in genres {
                if self.first_sighting(&genre_node) {
                    self.stats.genres += 1;
                    self.node(&genre_node, Class::Genre);
                    self.push(&genre_node, Predicate::Label, Term::Text(label.to_string()));
                }
                self.push(&track_node, Predicate::HasGenre, Term::Node(genre_node));
            }
        }

        if let Some(features) = features_by_id.get(&track.id) {
            let features_node = LocalName::audio_features(&track.id);
            if self.first_sighting(&features_node) {
                self.stats.audio_features += 1;
                self.node(&features_node, Class::AudioFeature);
                self.push(&features_node, Predicate::Tempo, Term::Float(features.tempo));
                self.push(&features_node, Predicate::Energy, Term::Float(features.energy));
                self.push(
                    &features_node,
                    Predicate::Danceability,
                    Term::Float(features.danceability),
                );
                self.push(&features_node, Predicate::Valence, Term::Float(features.valence));
            }
            self.push(&track_node, Predicate::HasFeature, Term::Node(features_node));
        }
    }

    fn first_sighting(&mut self, node: &LocalName) -> bool {
        self.seen.insert(node.clone())
    }

    fn node(&mut self, subject: &LocalName, class: Class) {
        self.push(subject, Predicate::Type, Term::Class(class));
    }

    fn push(&mut self, subject: &LocalName, predicate: Predicate, object: Term) {
        self.facts.push(Fact::new(subject.clone(), predicate, object));
    }
}

/// Genre nodes of an artist with their first label, one per slug.
fn genre_nodes(labels: Option<&Vec<String>>) -> Vec<(LocalName, &str)> {
    let mut nodes: Vec<(LocalName, &str)> = Vec::new();
    for label in labels.into_iter().flatten() {
        let node = LocalName::genre(label);
        if node.as_str() == "genre_" {
            continue;
        }
        if !nodes.iter().any(|(n, _)| *n == node) {
            nodes.push((node, label.as_str()));
        }
    }
    nodes
}
