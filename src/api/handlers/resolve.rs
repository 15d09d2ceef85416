use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{AppState, internal_error};
use crate::api::models::{ResolveParams, ResolveResponse};

pub async fn resolve_venue(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> impl IntoResponse {
    let config = match state.static_config().await {
        Ok(config) => config,
        Err(e) => return internal_error("Config Error", e),
    };

    let threshold = params.threshold.unwrap_or(state.resolver.threshold);
    let best = config.resolver.resolve(&params.q, threshold);
    let candidates = params
        .debug
        .then(|| config.resolver.rank(&params.q, state.resolver.debug_top));

    Json(ResolveResponse {
        query: params.q,
        best,
        candidates,
    })
    .into_response()
}
