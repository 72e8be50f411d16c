use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header::CONTENT_TYPE, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::ballot::BallotStore;
use crate::error::AppError;
use crate::models::Place;
use crate::search::Rect;
use crate::state::AppState;
use crate::tally::{tally, TallyResult};

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_handler))
        .route("/config", get(config_handler))
        .route("/search", get(search_handler))
        .route("/polls", post(create_poll_handler))
        .route("/polls/:poll_id", get(get_poll_handler))
        .route("/polls/:poll_id/tally", get(tally_handler))
        .route("/votes", post(submit_vote_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigResponse {
    map_client_id: String,
}

// The map widget needs a client id but the secret-bearing search credentials
// stay server-side
async fn config_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConfigResponse>, AppError> {
    let map_client_id = state
        .config
        .map_client_id
        .clone()
        .ok_or_else(|| AppError::Internal("map client id is not configured".to_string()))?;

    Ok(Json(ConfigResponse { map_client_id }))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: Option<String>,
    rect: Option<String>,
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Place>>, AppError> {
    let query = params.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "query parameter is required".to_string(),
        ));
    }

    let rect = match params.rect.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(raw.parse::<Rect>()?),
        _ => None,
    };

    let places = state.search.search(query, rect.as_ref()).await?;
    info!("Search for {query:?} returned {} places", places.len());
    Ok(Json(places))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateInput {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    road_address: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

// Search results carry no id of their own; derive one so the same listing
// submitted by two users lands on the same candidate.
fn place_from_candidate(input: CandidateInput) -> Result<Place, AppError> {
    let name = input.name.unwrap_or_default();
    let address = input.address.unwrap_or_default();
    if name.trim().is_empty() || address.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "every candidate needs a name and an address".to_string(),
        ));
    }

    let id = match input.id {
        Some(id) if !id.trim().is_empty() => id,
        _ => Place::derive_id(&name, &address),
    };

    Ok(Place {
        id,
        name,
        address,
        road_address: input.road_address.filter(|road| !road.trim().is_empty()),
        url: input.url.unwrap_or_default(),
        latitude: input.latitude.unwrap_or(0.0),
        longitude: input.longitude.unwrap_or(0.0),
    })
}

#[derive(Debug, Deserialize)]
struct CreatePollRequest {
    candidates: Option<Vec<CandidateInput>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePollResponse {
    poll_id: String,
    created: bool,
}

async fn create_poll_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePollRequest>,
) -> Result<impl IntoResponse, AppError> {
    let candidates = body
        .candidates
        .ok_or_else(|| AppError::InvalidInput("candidates are required".to_string()))?;

    let mut ballot = BallotStore::new();
    for candidate in candidates {
        ballot.add(place_from_candidate(candidate)?);
    }

    let (poll_id, created) = state.db.create_poll(ballot.items()).await?;
    if created {
        info!("Created poll {poll_id} with {} candidates", ballot.len());
    }

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(CreatePollResponse { poll_id, created })))
}

#[derive(Debug, Serialize)]
struct PollResponse {
    candidates: Vec<Place>,
    votes: BTreeMap<String, Vec<String>>,
}

async fn get_poll_handler(
    State(state): State<Arc<AppState>>,
    Path(poll_id): Path<String>,
) -> Result<Json<PollResponse>, AppError> {
    let poll = state.db.get_poll(&poll_id).await?;
    let votes = state
        .db
        .get_votes(&poll_id)
        .await?
        .into_iter()
        .map(|record| (record.voter_name, record.selections))
        .collect();

    Ok(Json(PollResponse {
        candidates: poll.candidates,
        votes,
    }))
}

async fn tally_handler(
    State(state): State<Arc<AppState>>,
    Path(poll_id): Path<String>,
) -> Result<Json<TallyResult>, AppError> {
    let poll = state.db.get_poll(&poll_id).await?;
    let votes = state.db.get_votes(&poll_id).await?;

    Ok(Json(tally(&poll, &votes)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitVoteRequest {
    poll_id: Option<String>,
    user_name: Option<String>,
    selections: Option<Vec<String>>,
}

async fn submit_vote_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitVoteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let poll_id = body.poll_id.unwrap_or_default();
    let user_name = body.user_name.unwrap_or_default();
    let missing_selections = body.selections.is_none();
    if poll_id.trim().is_empty() || user_name.trim().is_empty() || missing_selections {
        return Err(AppError::InvalidInput(
            "pollId, userName and selections are required".to_string(),
        ));
    }
    let selections = body.selections.unwrap_or_default();

    state.db.save_vote(&poll_id, &user_name, selections).await?;
    info!("Recorded vote by {user_name:?} on poll {poll_id}");

    Ok(Json(json!({ "message": "Vote submitted." })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, address: &str) -> CandidateInput {
        CandidateInput {
            id: None,
            name: Some(name.to_string()),
            address: Some(address.to_string()),
            road_address: None,
            url: None,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn candidates_without_an_id_get_a_derived_one() {
        let place = place_from_candidate(candidate("Soup Place", "Seoul Jung-gu 1")).unwrap();
        assert_eq!(place.id, Place::derive_id("Soup Place", "Seoul Jung-gu 1"));
    }

    #[test]
    fn provided_ids_are_kept() {
        let mut input = candidate("Soup Place", "Seoul Jung-gu 1");
        input.id = Some("abc123".to_string());
        let place = place_from_candidate(input).unwrap();
        assert_eq!(place.id, "abc123");
    }

    #[test]
    fn blank_name_or_address_is_rejected() {
        let err = place_from_candidate(candidate(" ", "Seoul Jung-gu 1")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = place_from_candidate(candidate("Soup Place", "")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn blank_road_address_becomes_none() {
        let mut input = candidate("Soup Place", "Seoul Jung-gu 1");
        input.road_address = Some("  ".to_string());
        let place = place_from_candidate(input).unwrap();
        assert_eq!(place.road_address, None);
    }
}
