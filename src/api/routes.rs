use axum::{Router, routing::get};
use std::sync::Arc;

use crate::api::handlers::{
    AppState,
    resolve::resolve_venue,
    slots::{get_sport_slots, get_venue_slots},
    venues::get_venues,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/slots/:sport", get(get_sport_slots))
        .route("/api/slots/:sport/:venue", get(get_venue_slots))
        .route("/api/venues", get(get_venues))
        .route("/api/resolve", get(resolve_venue))
        .with_state(state)
}
