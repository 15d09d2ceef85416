use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{AppState, internal_error};
use crate::api::models::VenueListItem;

pub async fn get_venues(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = match state.static_config().await {
        Ok(config) => config,
        Err(e) => return internal_error("Config Error", e),
    };

    let venues: Vec<VenueListItem> = config
        .registry
        .all()
        .iter()
        .map(|venue| VenueListItem {
            id: venue.id().to_string(),
            name: venue.name().to_string(),
            sport: venue.sport(),
            source: venue.source(),
        })
        .collect();

    Json(venues).into_response()
}
