//! Fake provider library data
//!
//! Track `i` is `track_{i}` ("Song {i}"), performed by `artist_{i % 3}`.
//! Artist genres are chosen so two labels collapse to the same genre node.

use super::constants::*;
use serde_json::{json, Value};

pub fn track_id(i: usize) -> String {
    format!("track_{}", i)
}

pub fn artist_id(i: usize) -> String {
    format!("artist_{}", i)
}

fn track_index(id: &str) -> Option<usize> {
    id.strip_prefix("track_")?.parse().ok()
}

fn artist_index(id: &str) -> Option<usize> {
    id.strip_prefix("artist_")?.parse().ok()
}

/// `artist_0` and `artist_1` share the `genre_hip_hop` node.
pub fn artist_genres(i: usize) -> Vec<&'static str> {
    match i {
        0 => vec!["hip hop", "rap"],
        1 => vec!["Hip-Hop"],
        _ => vec![],
    }
}

fn saved_track(i: usize) -> Value {
    let artist = i % LIBRARY_ARTISTS;
    json!({
        "added_at": "2024-01-01T00:00:00Z",
        "track": {
            "id": track_id(i),
            "name": format!("Song {}", i),
            "artists": [{"id": artist_id(artist), "name": format!("Artist {}", artist)}]
        }
    })
}

/// A page of `GET /me/tracks`. The first page also carries a placeholder
/// item without a track, which the import must skip.
pub fn saved_tracks_page(base_url: &str, offset: usize, limit: usize) -> Value {
    let end = (offset + limit).min(LIBRARY_SIZE);
    let mut items: Vec<Value> = (offset..end).map(saved_track).collect();
    if offset == 0 {
        items.push(json!({"added_at": "2024-01-01T00:00:00Z", "track": null}));
    }
    let next = if end < LIBRARY_SIZE {
        Value::String(format!(
            "{}/v1/me/tracks?limit={}&offset={}",
            base_url, limit, end
        ))
    } else {
        Value::Null
    };
    json!({
        "items": items,
        "next": next,
        "total": LIBRARY_SIZE,
    })
}

pub fn has_features(i: usize) -> bool {
    i % 10 != 0
}

pub fn audio_features(ids: &[&str]) -> Value {
    let features: Vec<Value> = ids
        .iter()
        .map(|id| match track_index(id) {
            Some(i) if i < LIBRARY_SIZE && has_features(i) => json!({
                "id": id,
                "tempo": 100.0 + i as f64,
                "energy": 0.5,
                "danceability": 0.6,
                "valence": 0.7,
            }),
            _ => Value::Null,
        })
        .collect();
    json!({ "audio_features": features })
}

pub fn artists(ids: &[&str]) -> Value {
    let artists: Vec<Value> = ids
        .iter()
        .map(|id| match artist_index(id) {
            Some(i) if i < LIBRARY_ARTISTS => json!({
                "id": id,
                "name": format!("Artist {}", i),
                "genres": artist_genres(i),
            }),
            _ => Value::Null,
        })
        .collect();
    json!({ "artists": artists })
}

/// SPARQL JSON results with one binding per `(name, value)` row.
pub fn select_results(vars: &[&str], rows: &[Vec<(&str, Value)>]) -> Value {
    let bindings: Vec<Value> = rows
        .iter()
        .map(|row| {
            let mut binding = serde_json::Map::new();
            for (name, value) in row {
                binding.insert(name.to_string(), value.clone());
            }
            Value::Object(binding)
        })
        .collect();
    json!({
        "head": { "vars": vars },
        "results": { "bindings": bindings },
    })
}

pub fn uri(value: &str) -> Value {
    json!({"type": "uri", "value": value})
}

pub fn literal(value: &str) -> Value {
    json!({"type": "literal", "value": value})
}

pub fn typed_literal(value: &str, datatype: &str) -> Value {
    json!({"type": "literal", "value": value, "datatype": datatype})
}
