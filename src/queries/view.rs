//! Flattening of store results into plain rows and graph views.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::graph_store::{Binding, SelectResults};

/// A result row with the store's type wrappers stripped.
pub type Row = BTreeMap<String, String>;

pub fn flatten_rows(results: SelectResults) -> Vec<Row> {
    results
        .into_bindings()
        .into_iter()
        .map(|binding| {
            binding
                .into_iter()
                .map(|(variable, bound)| (variable, bound.value))
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Track,
    Artist,
    Genre,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Collects nodes and edges, keeping the first node seen for each id.
#[derive(Default)]
struct GraphViewBuilder {
    view: GraphView,
    seen: HashSet<String>,
}

impl GraphViewBuilder {
    fn node(&mut self, id: &str, label: String, node_type: NodeType) {
        if self.seen.insert(id.to_string()) {
            self.view.nodes.push(Node {
                id: id.to_string(),
                label,
                node_type,
            });
        }
    }

    fn edge(&mut self, source: &str, target: &str, edge_type: &'static str) {
        self.view.edges.push(Edge {
            source: source.to_string(),
            target: target.to_string(),
            edge_type: Some(edge_type),
        });
    }

    fn finish(self) -> GraphView {
        self.view
    }
}

fn value<'a>(binding: &'a Binding, variable: &str) -> Option<&'a str> {
    binding.get(variable).map(|b| b.value.as_str())
}

/// Readable label for a genre IRI without a stored label:
/// `...#genre_hip_hop` becomes `hip hop`.
fn genre_label_from_iri(iri: &str) -> String {
    let local = iri.rsplit('#').next().unwrap_or(iri);
    local
        .strip_prefix("genre_")
        .unwrap_or(local)
        .replace('_', " ")
}

fn genre_label(binding: &Binding, genre: &str) -> String {
    value(binding, "genreLabel")
        .map(str::to_string)
        .unwrap_or_else(|| genre_label_from_iri(genre))
}

/// Tracks linked to their genres.
pub fn genre_graph(results: &SelectResults) -> GraphView {
    let mut builder = GraphViewBuilder::default();
    for binding in results.bindings() {
        let (Some(track), Some(title), Some(genre)) = (
            value(binding, "track"),
            value(binding, "title"),
            value(binding, "genre"),
        ) else {
            continue;
        };
        builder.node(track, title.to_string(), NodeType::Track);
        builder.node(genre, genre_label(binding, genre), NodeType::Genre);
        builder.edge(track, genre, "track-to-genre");
    }
    builder.finish()
}

/// Artists linked to their genres and their tracks.
pub fn artist_graph(results: &SelectResults) -> GraphView {
    let mut builder = GraphViewBuilder::default();
    for binding in results.bindings() {
        let (Some(artist), Some(artist_name)) =
            (value(binding, "artist"), value(binding, "artistName"))
        else {
            continue;
        };
        builder.node(artist, artist_name.to_string(), NodeType::Artist);

        if let Some(genre) = value(binding, "genre") {
            builder.node(genre, genre_label(binding, genre), NodeType::Genre);
            builder.edge(genre, artist, "genre-to-artist");
        }

        if let (Some(track), Some(track_name)) =
            (value(binding, "track"), value(binding, "trackName"))
        {
            builder.node(track, track_name.to_string(), NodeType::Track);
            builder.edge(artist, track, "artist-to-track");
        }
    }
    builder.finish()
}
