use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{PlannedRequest, Room, SourceFetcher};
use crate::config::{StaffMode, StaffSelector, YClientsVenue};
use crate::domain::{CanonicalSlot, DATE_FORMAT};
use crate::errors::parse_context;
use crate::http::UpstreamRequest;
use crate::pagination::{HorizonConfig, TimeUnit, parse_local_datetime};

const TIMESLOTS_PATH: &str = "/api/v1/b2c/booking/availability/search-timeslots";

/// How the `staff_id` key of a search record is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StaffField<'a> {
    Omitted,
    Null,
    Id(&'a str),
}

#[derive(Debug, Deserialize)]
struct TimeslotResponse {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TimeslotRecord {
    attributes: TimeslotAttributes,
}

#[derive(Debug, Deserialize)]
struct TimeslotAttributes {
    datetime: String,
    #[serde(default)]
    is_bookable: bool,
}

/// YClients b2c availability search; one request per day and staff member
pub struct YClientsFetcher<'a> {
    venue: &'a YClientsVenue,
    horizon: u32,
}

impl<'a> YClientsFetcher<'a> {
    pub fn new(venue: &'a YClientsVenue, horizon: u32) -> Self {
        Self { venue, horizon }
    }

    fn request(&self, day: NaiveDate, staff: StaffField<'_>) -> UpstreamRequest {
        let url = format!("{}{}", self.venue.base_url.trim_end_matches('/'), TIMESLOTS_PATH);
        UpstreamRequest::post_json(url, build_body(self.venue.location_id, day, staff))
            .with_header("Authorization", format!("Bearer {}", self.venue.token))
            .with_header("Accept", "application/vnd.api.v2+json")
    }
}

impl SourceFetcher for YClientsFetcher<'_> {
    fn horizon(&self, today: NaiveDate) -> HorizonConfig {
        HorizonConfig::days(today, self.horizon)
    }

    fn plan(&self, unit: TimeUnit) -> Vec<PlannedRequest> {
        let day = unit.first_day();
        match &self.venue.staff {
            StaffSelector::Mode(StaffMode::Omitted) => {
                vec![PlannedRequest::new(self.request(day, StaffField::Omitted))]
            }
            StaffSelector::Mode(StaffMode::Null) => {
                vec![PlannedRequest::new(self.request(day, StaffField::Null))]
            }
            StaffSelector::Rooms(rooms) => rooms
                .iter()
                .map(|(staff_id, name)| {
                    let room = Room {
                        key: staff_id.clone(),
                        name: name.clone(),
                    };
                    PlannedRequest::for_room(self.request(day, StaffField::Id(staff_id)), room)
                })
                .collect(),
        }
    }

    fn parse(&self, planned: &PlannedRequest, _unit: TimeUnit, body: &str) -> Result<Vec<CanonicalSlot>> {
        let response: TimeslotResponse = serde_json::from_str(body).context(parse_context("yclients timeslots"))?;
        if let Some(errors) = response.errors.filter(|e| !e.is_null()) {
            anyhow::bail!("yclients returned an error: {}", errors);
        }
        Ok(parse_timeslots(&response.data, self.venue.duration, planned.room.as_ref()))
    }
}

fn build_body(location_id: u64, day: NaiveDate, staff: StaffField<'_>) -> Value {
    let mut record = Map::new();
    match staff {
        StaffField::Omitted => {}
        StaffField::Null => {
            record.insert("staff_id".to_string(), Value::Null);
        }
        StaffField::Id(id) => {
            let value = id.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::from(id));
            record.insert("staff_id".to_string(), value);
        }
    }
    record.insert("attendance_service_items".to_string(), json!([]));

    json!({
        "context": { "location_id": location_id },
        "filter": {
            "date": day.format(DATE_FORMAT).to_string(),
            "records": [Value::Object(record)],
        }
    })
}

fn parse_timeslots(data: &[Value], duration: u32, room: Option<&Room>) -> Vec<CanonicalSlot> {
    data.iter()
        .filter_map(|item| match serde_json::from_value::<TimeslotRecord>(item.clone()) {
            Ok(record) => Some(record.attributes),
            Err(e) => {
                debug!("Skipping unreadable yclients timeslot: {}", e);
                None
            }
        })
        .filter(|attributes| attributes.is_bookable)
        .filter_map(|attributes| {
            let start = parse_local_datetime(&attributes.datetime)?;
            let slot = CanonicalSlot::new(start, duration)?;
            Some(match room {
                Some(room) => slot.with_room(room.key.clone(), Some(&room.name)),
                None => slot,
            })
        })
        .collect()
}
