use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{PlannedRequest, SourceFetcher};
use crate::config::FindSportVenue;
use crate::domain::{CanonicalSlot, DATE_FORMAT, TIME_FORMAT};
use crate::errors::parse_context;
use crate::http::{UpstreamRequest, with_query};
use crate::pagination::{HorizonConfig, TimeUnit};

/// Grid status of a half-hour that somebody has already booked
pub const BOOKED_STATUS: i64 = 12;
/// Bookings are whole hours on a half-hour grid
const SLOT_MINUTES: u32 = 60;
const LAST_HALF_HOUR: &str = "23:30";

/// time of day → court id → status code
type OccupancyGrid = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    schedule: OccupancyGrid,
}

/// FindSport occupancy grid, one day per request
pub struct FindSportFetcher<'a> {
    venue: &'a FindSportVenue,
    horizon: u32,
}

impl<'a> FindSportFetcher<'a> {
    pub fn new(venue: &'a FindSportVenue, horizon: u32) -> Self {
        Self { venue, horizon }
    }
}

impl SourceFetcher for FindSportFetcher<'_> {
    fn horizon(&self, today: NaiveDate) -> HorizonConfig {
        HorizonConfig::days(today, self.horizon)
    }

    fn plan(&self, unit: TimeUnit) -> Vec<PlannedRequest> {
        let base = format!(
            "{}/api/playgrounds/{}/schedule",
            self.venue.base_url.trim_end_matches('/'),
            self.venue.playground_id
        );
        let url = with_query(&base, &[("date", unit.first_day().format(DATE_FORMAT).to_string())]);
        vec![PlannedRequest::new(UpstreamRequest::get(url))]
    }

    fn parse(&self, _planned: &PlannedRequest, unit: TimeUnit, body: &str) -> Result<Vec<CanonicalSlot>> {
        let response: ScheduleResponse = serde_json::from_str(body).context(parse_context("findsport schedule"))?;
        Ok(free_hours(&response.schedule, unit.first_day(), &self.venue.courts))
    }
}

/// Hour-long free slots: a half-hour can start one only when it and the next
/// half-hour are both known and unbooked for the same court
fn free_hours(grid: &OccupancyGrid, day: NaiveDate, court_names: &BTreeMap<String, String>) -> Vec<CanonicalSlot> {
    let mut slots = Vec::new();

    for (time, courts) in grid {
        if time == LAST_HALF_HOUR {
            continue;
        }
        let Ok(start) = NaiveTime::parse_from_str(time, TIME_FORMAT) else {
            debug!("Skipping findsport row with unreadable time: {}", time);
            continue;
        };
        let next_time = (start + TimeDelta::minutes(30)).format(TIME_FORMAT).to_string();
        let next_row = grid.get(&next_time);

        for (court, status) in courts {
            let next_status = next_row.and_then(|row| row.get(court));
            if !(is_free(status) && next_status.is_some_and(is_free)) {
                continue;
            }
            let name = court_names.get(court).map(String::as_str).unwrap_or(court);
            if let Some(slot) = CanonicalSlot::new(day.and_time(start), SLOT_MINUTES) {
                slots.push(slot.with_room(court.clone(), Some(name)));
            }
        }
    }

    slots
}

fn is_free(status: &Value) -> bool {
    status.as_i64().is_some_and(|code| code != BOOKED_STATUS)
}
