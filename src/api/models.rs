use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SourceKind;
use crate::domain::{DateSlotMap, Sport, VenueFetchStatus};
use crate::resolver::VenueMatch;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueListItem {
    pub id: String,
    pub name: String,
    pub sport: Sport,
    pub source: SourceKind,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueSlotsResponse {
    pub venue_id: String,
    pub last_updated: DateTime<Utc>,
    pub slots: DateSlotMap,
    pub status: Option<VenueFetchStatus>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub query: String,
    pub best: Option<VenueMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<VenueMatch>>,
}

#[derive(Deserialize)]
pub struct ResolveParams {
    pub q: String,
    #[serde(default)]
    pub debug: bool,
    pub threshold: Option<f64>,
}
