//! Typed terms of the library graph.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

/// Namespace every local name lives in.
pub const NAMESPACE: &str = "http://example.org/spotify#";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

lazy_static! {
    static ref NON_ALPHANUMERIC_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref LOCAL_NAME_FRAGMENT: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

/// Whether `value` can be written verbatim as (part of) a local name.
pub fn is_local_name_fragment(value: &str) -> bool {
    LOCAL_NAME_FRAGMENT.is_match(value)
}

/// Lower-cases `label` and collapses every run of non-alphanumeric
/// characters into one underscore, trimming underscores at both ends.
///
/// `slug("Hip-Hop!!") == "hip_hop"`. Distinct labels can share a slug, in
/// which case they name the same genre.
pub fn slug(label: &str) -> String {
    let lowered = label.to_lowercase();
    NON_ALPHANUMERIC_RUN
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// The local name of a graph node, written `:<name>` in documents.
///
/// Names are used verbatim: provider ids must pass
/// [`is_local_name_fragment`] before they get here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalName(String);

impl LocalName {
    pub fn track(track_id: &str) -> Self {
        Self(track_id.to_string())
    }

    pub fn artist(artist_id: &str) -> Self {
        Self(artist_id.to_string())
    }

    /// Genre names derive from the slug of their display label.
    pub fn genre(label: &str) -> Self {
        Self(format!("genre_{}", slug(label)))
    }

    pub fn audio_features(track_id: &str) -> Self {
        Self(format!("feat_{}", track_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Track,
    Artist,
    Genre,
    AudioFeature,
}

impl Class {
    pub fn local_name(&self) -> &'static str {
        match self {
            Class::Track => "Track",
            Class::Artist => "Artist",
            Class::Genre => "Genre",
            Class::AudioFeature => "AudioFeature",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `rdf:type`
    Type,
    Title,
    Name,
    Label,
    PerformedBy,
    HasGenre,
    HasFeature,
    Tempo,
    Energy,
    Danceability,
    Valence,
}

impl Predicate {
    pub fn local_name(&self) -> &'static str {
        match self {
            Predicate::Type => "type",
            Predicate::Title => "title",
            Predicate::Name => "name",
            Predicate::Label => "label",
            Predicate::PerformedBy => "performedBy",
            Predicate::HasGenre => "hasGenre",
            Predicate::HasFeature => "hasFeature",
            Predicate::Tempo => "tempo",
            Predicate::Energy => "energy",
            Predicate::Danceability => "danceability",
            Predicate::Valence => "valence",
        }
    }
}

/// Object position of a fact.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Node(LocalName),
    Class(Class),
    /// Free text, escaped on serialization.
    Text(String),
    /// Written as an `xsd:float` typed literal.
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub subject: LocalName,
    pub predicate: Predicate,
    pub object: Term,
}

impl Fact {
    pub fn new(subject: LocalName, predicate: Predicate, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}
