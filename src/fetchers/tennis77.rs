use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

use super::{PlannedRequest, SourceFetcher, value_to_key};
use crate::config::Tennis77Venue;
use crate::domain::{CanonicalSlot, DATE_FORMAT};
use crate::errors::parse_context;
use crate::http::{UpstreamRequest, with_query};
use crate::pagination::{HorizonConfig, TimeUnit, parse_local_datetime};

/// Upstream reports hour-long lessons as 59 minutes
const SHORT_HOUR: u32 = 59;

#[derive(Debug, Deserialize)]
struct Lesson {
    #[serde(default)]
    id: Option<Value>,
    start: String,
    duration: u32,
    #[serde(default)]
    court: Option<Court>,
    #[serde(default)]
    available_for_enrollment: bool,
    #[serde(default)]
    customers: Option<Vec<Value>>,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Court {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
}

impl Lesson {
    fn is_free(&self) -> bool {
        self.available_for_enrollment && self.customers.as_ref().is_none_or(Vec::is_empty)
    }
}

/// Tennis77 lesson list, requested over date ranges
pub struct Tennis77Fetcher<'a> {
    venue: &'a Tennis77Venue,
    horizon: u32,
}

impl<'a> Tennis77Fetcher<'a> {
    pub fn new(venue: &'a Tennis77Venue, horizon: u32) -> Self {
        Self { venue, horizon }
    }
}

impl SourceFetcher for Tennis77Fetcher<'_> {
    fn horizon(&self, today: NaiveDate) -> HorizonConfig {
        HorizonConfig::ranges(today, self.horizon, self.venue.chunk_days)
    }

    fn plan(&self, unit: TimeUnit) -> Vec<PlannedRequest> {
        let base = format!(
            "{}/api/v1/clubs/{}/lessons",
            self.venue.base_url.trim_end_matches('/'),
            self.venue.club_id
        );
        let url = with_query(
            &base,
            &[
                ("from", unit.first_day().format(DATE_FORMAT).to_string()),
                ("to", unit.last_day().format(DATE_FORMAT).to_string()),
            ],
        );
        vec![PlannedRequest::new(UpstreamRequest::get(url))]
    }

    fn parse(&self, _planned: &PlannedRequest, _unit: TimeUnit, body: &str) -> Result<Vec<CanonicalSlot>> {
        let response: Value = serde_json::from_str(body).context(parse_context("tennis77 lessons"))?;
        let records = match &response {
            Value::Array(records) => records,
            Value::Object(map) => match map.get("data") {
                Some(Value::Array(records)) => records,
                _ => anyhow::bail!("tennis77 returned no lesson list: {}", truncate(body)),
            },
            _ => anyhow::bail!("tennis77 returned an unexpected payload: {}", truncate(body)),
        };
        Ok(records
            .iter()
            .enumerate()
            .filter_map(|(position, record)| parse_lesson(position, record))
            .collect())
    }
}

/// Lessons without a court are keyed by their own id, or by position in the response
fn parse_lesson(position: usize, record: &Value) -> Option<CanonicalSlot> {
    let lesson = match serde_json::from_value::<Lesson>(record.clone()) {
        Ok(lesson) => lesson,
        Err(e) => {
            debug!("Skipping unreadable tennis77 lesson: {}", e);
            return None;
        }
    };
    if !lesson.is_free() {
        return None;
    }

    let start = parse_local_datetime(&lesson.start)?;
    let court_key = lesson
        .court
        .as_ref()
        .and_then(|court| court.id.as_ref().and_then(value_to_key).or_else(|| court.name.clone()))
        .or_else(|| lesson.id.as_ref().and_then(value_to_key).map(|id| format!("lesson-{}", id)))
        .unwrap_or_else(|| format!("record-{}", position));
    let court_name = lesson.court.as_ref().and_then(|court| court.name.as_deref());

    let slot = CanonicalSlot::new(start, normalize_duration(lesson.duration))?
        .with_price(lesson.price)
        .with_room(court_key, court_name);
    Some(slot)
}

pub fn normalize_duration(minutes: u32) -> u32 {
    if minutes == SHORT_HOUR { 60 } else { minutes }
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}
