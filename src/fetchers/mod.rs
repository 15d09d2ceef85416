mod findsport;
mod moyklass;
mod reservi;
mod tennis77;
mod tennis_ru;
mod vivacrm;
mod yclients;

pub use findsport::FindSportFetcher;
pub use moyklass::MoyKlassFetcher;
pub use reservi::ReserviFetcher;
pub use tennis77::Tennis77Fetcher;
pub use tennis_ru::TennisRuFetcher;
pub use vivacrm::{VivaFetcher, parse_iso_duration};
pub use yclients::YClientsFetcher;

use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, info};
use serde_json::Value;

use crate::config::VenueConfig;
use crate::domain::{CanonicalSlot, DATE_FORMAT, FetchProgress, SlotCollection, VenueFetchStatus};
use crate::http::{RateLimitedClient, UpstreamRequest};
use crate::pagination::{HorizonConfig, HorizonIterator, TimeUnit};

/// Upstream room a request is scoped to, when a platform needs one request per room
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub key: String,
    pub name: String,
}

/// A request plus whatever the parser needs to know about why it was sent
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRequest {
    pub request: UpstreamRequest,
    pub room: Option<Room>,
}

impl PlannedRequest {
    pub fn new(request: UpstreamRequest) -> Self {
        Self { request, room: None }
    }

    pub fn for_room(request: UpstreamRequest, room: Room) -> Self {
        Self {
            request,
            room: Some(room),
        }
    }
}

/// What one booking platform knows: how to page its schedule, what to send
/// for each page and how to read the answer.
///
/// `parse` fails only when the whole response is unusable (undecodable
/// envelope, explicit upstream error); a malformed record is dropped.
pub trait SourceFetcher {
    fn horizon(&self, today: NaiveDate) -> HorizonConfig;

    fn plan(&self, unit: TimeUnit) -> Vec<PlannedRequest>;

    fn parse(&self, planned: &PlannedRequest, unit: TimeUnit, body: &str) -> Result<Vec<CanonicalSlot>>;
}

/// Everything fetched for one venue in one run
pub struct VenueFetch {
    pub slots: SlotCollection,
    pub status: VenueFetchStatus,
}

/// Fetch a venue's free slots with the fetcher matching its platform
pub async fn fetch_venue(client: &mut RateLimitedClient, venue: &VenueConfig, today: NaiveDate) -> VenueFetch {
    info!("Fetching {} ({:?}, {})", venue.id(), venue.source(), venue.name());
    client.set_delay(venue.delay_ms());
    let horizon = venue.horizon();

    match venue {
        VenueConfig::Reservi(v) => run(client, venue.id(), &ReserviFetcher::new(v, horizon), today).await,
        VenueConfig::YClients(v) => run(client, venue.id(), &YClientsFetcher::new(v, horizon), today).await,
        VenueConfig::VivaCrm(v) => run(client, venue.id(), &VivaFetcher::new(v, horizon), today).await,
        VenueConfig::MoyKlass(v) => run(client, venue.id(), &MoyKlassFetcher::new(v, horizon), today).await,
        VenueConfig::FindSport(v) => run(client, venue.id(), &FindSportFetcher::new(v, horizon), today).await,
        VenueConfig::Tennis77(v) => run(client, venue.id(), &Tennis77Fetcher::new(v, horizon), today).await,
        VenueConfig::TennisRu(v) => run(client, venue.id(), &TennisRuFetcher::new(v, horizon), today).await,
    }
}

/// Walk the horizon unit by unit; a failing unit is recorded and skipped
pub async fn run<F: SourceFetcher>(
    client: &mut RateLimitedClient,
    venue_id: &str,
    fetcher: &F,
    today: NaiveDate,
) -> VenueFetch {
    let horizon = fetcher.horizon(today);
    let mut progress = FetchProgress::new(venue_id, horizon.unit_count());
    let mut slots = SlotCollection::new();

    for unit in HorizonIterator::new(horizon) {
        let label = unit.to_string();
        match fetch_unit(client, fetcher, unit).await {
            Ok(unit_slots) => {
                let unit_slots = drop_past(unit_slots, today);
                progress.record_ok(&label, unit_slots.len());
                slots.extend(unit_slots);
            }
            Err(e) => progress.record_failed(&label, &e),
        }
    }

    if slots.duplicates() > 0 {
        debug!("  {}: dropped {} duplicate slots", venue_id, slots.duplicates());
    }

    VenueFetch {
        slots,
        status: progress.into_status(),
    }
}

async fn fetch_unit<F: SourceFetcher>(
    client: &mut RateLimitedClient,
    fetcher: &F,
    unit: TimeUnit,
) -> Result<Vec<CanonicalSlot>> {
    let mut slots = Vec::new();
    for planned in fetcher.plan(unit) {
        let body = client.fetch_text(&planned.request).await?;
        slots.extend(fetcher.parse(&planned, unit, &body)?);
    }
    Ok(slots)
}

// Week pages start on Monday and may list days that are already over
fn drop_past(slots: Vec<CanonicalSlot>, today: NaiveDate) -> Vec<CanonicalSlot> {
    let today = today.format(DATE_FORMAT).to_string();
    slots
        .into_iter()
        .filter(|slot| slot.date() >= today.as_str())
        .collect()
}

/// Identifier that upstreams send either as a string or as a number
pub(crate) fn value_to_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Amount from a price label such as "2 500 ₽"
pub(crate) fn parse_price_text(text: &str) -> Option<f64> {
    let digits: String = text
        .split(|c: char| !(c.is_ascii_digit() || c.is_whitespace() || c == '\u{a0}' || c == '.' || c == ','))
        .map(|part| part.trim())
        .find(|part| part.chars().any(|c| c.is_ascii_digit()))?
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    digits.parse().ok()
}
