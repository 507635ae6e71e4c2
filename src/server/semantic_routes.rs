//! Recommendation queries. Each returns the flattened result rows.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use super::error::ApiResult;
use super::state::{GuardedGraphStore, ServerState};
use crate::queries::{flatten_rows, GenreRecsParams, PartyTracksParams, Row, SimilarParams};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PartyTracksQuery {
    min_energy: Option<String>,
    min_dance: Option<String>,
    min_tempo: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SimilarQuery {
    seed_id: Option<String>,
    d: Option<String>,
    t: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct GenreRecsBody {
    #[serde(default, deserialize_with = "liked_or_empty")]
    liked: Vec<String>,
}

/// Anything other than an array, `null` included, counts as no liked tracks.
fn liked_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(id) => Ok(id),
                other => Err(de::Error::custom(format!(
                    "liked must only contain strings, got {}",
                    other
                ))),
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

async fn run_select(store: &GuardedGraphStore, query: &str) -> ApiResult<Json<Vec<Row>>> {
    let results = store.select(query).await?;
    Ok(Json(flatten_rows(results)))
}

async fn party_tracks(
    State(store): State<GuardedGraphStore>,
    Query(query): Query<PartyTracksQuery>,
) -> ApiResult<Json<Vec<Row>>> {
    let params = PartyTracksParams::parse(
        query.min_energy.as_deref(),
        query.min_dance.as_deref(),
        query.min_tempo.as_deref(),
    )?;
    run_select(&store, &params.render()).await
}

async fn similar(
    State(store): State<GuardedGraphStore>,
    Query(query): Query<SimilarQuery>,
) -> ApiResult<Json<Vec<Row>>> {
    let params = SimilarParams::parse(
        query.seed_id.as_deref(),
        query.d.as_deref(),
        query.t.as_deref(),
    )?;
    run_select(&store, &params.render()).await
}

async fn genre_recs(
    State(store): State<GuardedGraphStore>,
    body: Option<Json<GenreRecsBody>>,
) -> ApiResult<Json<Vec<Row>>> {
    let liked = body.map(|Json(b)| b.liked).unwrap_or_default();
    let params = GenreRecsParams::parse(liked)?;
    run_select(&store, &params.render()).await
}

pub fn make_semantic_routes(state: ServerState) -> Router {
    Router::new()
        .route("/party-tracks", get(party_tracks))
        .route("/similar", get(similar))
        .route("/genre-recs", post(genre_recs))
        .with_state(state)
}
