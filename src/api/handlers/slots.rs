use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{AppState, internal_error};
use crate::api::models::VenueSlotsResponse;
use crate::domain::Sport;

fn parse_sport(raw: &str) -> Option<Sport> {
    Sport::ALL.into_iter().find(|sport| sport.as_str() == raw)
}

pub async fn get_sport_slots(State(state): State<Arc<AppState>>, Path(sport): Path<String>) -> impl IntoResponse {
    let Some(sport) = parse_sport(&sport) else {
        return (StatusCode::NOT_FOUND, format!("Unknown sport: {}", sport)).into_response();
    };

    match state.storage.load(sport).await {
        Ok(Some(result)) => Json(result).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("No {} slots saved yet", sport)).into_response(),
        Err(e) => internal_error("Storage Error", e),
    }
}

pub async fn get_venue_slots(
    State(state): State<Arc<AppState>>,
    Path((sport, venue_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let Some(sport) = parse_sport(&sport) else {
        return (StatusCode::NOT_FOUND, format!("Unknown sport: {}", sport)).into_response();
    };

    let mut result = match state.storage.load(sport).await {
        Ok(Some(result)) => result,
        Ok(None) => return (StatusCode::NOT_FOUND, format!("No {} slots saved yet", sport)).into_response(),
        Err(e) => return internal_error("Storage Error", e),
    };

    match result.sites.remove(&venue_id) {
        Some(slots) => Json(VenueSlotsResponse {
            status: result.status.remove(&venue_id),
            venue_id,
            last_updated: result.last_updated,
            slots,
        })
        .into_response(),
        None => (StatusCode::NOT_FOUND, format!("No slots for venue {}", venue_id)).into_response(),
    }
}
