use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

use super::{PlannedRequest, SourceFetcher, value_to_key};
use crate::config::TennisRuVenue;
use crate::domain::{CanonicalSlot, DATE_FORMAT};
use crate::errors::parse_context;
use crate::http::{UpstreamRequest, with_query};
use crate::pagination::{HorizonConfig, TimeUnit, parse_local_datetime};

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    courts: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CourtSchedule {
    id: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rent_info: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RentInfo {
    start: String,
    finish: String,
    #[serde(default)]
    busy: Option<bool>,
    #[serde(default)]
    price: Option<f64>,
}

/// Tennis.ru partner schedule, one day per request behind Basic auth
pub struct TennisRuFetcher<'a> {
    venue: &'a TennisRuVenue,
    horizon: u32,
}

impl<'a> TennisRuFetcher<'a> {
    pub fn new(venue: &'a TennisRuVenue, horizon: u32) -> Self {
        Self { venue, horizon }
    }

    fn allows(&self, court_id: &str) -> bool {
        self.venue.courts.is_empty() || self.venue.courts.iter().any(|id| id == court_id)
    }
}

impl SourceFetcher for TennisRuFetcher<'_> {
    fn horizon(&self, today: NaiveDate) -> HorizonConfig {
        HorizonConfig::days(today, self.horizon)
    }

    fn plan(&self, unit: TimeUnit) -> Vec<PlannedRequest> {
        let base = format!(
            "{}/api/v2/places/{}/schedule",
            self.venue.base_url.trim_end_matches('/'),
            self.venue.place_id
        );
        let url = with_query(&base, &[("date", unit.first_day().format(DATE_FORMAT).to_string())]);
        let request = UpstreamRequest::get(url).with_basic_auth(&self.venue.username, &self.venue.password);
        vec![PlannedRequest::new(request)]
    }

    fn parse(&self, _planned: &PlannedRequest, _unit: TimeUnit, body: &str) -> Result<Vec<CanonicalSlot>> {
        let response: ScheduleResponse = serde_json::from_str(body).context(parse_context("tennis.ru schedule"))?;

        let mut slots = Vec::new();
        for record in response.courts {
            let court = match serde_json::from_value::<CourtSchedule>(record) {
                Ok(court) => court,
                Err(e) => {
                    debug!("Skipping unreadable tennis.ru court: {}", e);
                    continue;
                }
            };
            let Some(court_id) = value_to_key(&court.id) else {
                continue;
            };
            if !self.allows(&court_id) {
                continue;
            }
            slots.extend(
                court
                    .rent_info
                    .iter()
                    .filter_map(|entry| free_entry(entry, &court_id, court.name.as_deref())),
            );
        }
        Ok(slots)
    }
}

fn free_entry(entry: &Value, court_id: &str, court_name: Option<&str>) -> Option<CanonicalSlot> {
    let rent = match serde_json::from_value::<RentInfo>(entry.clone()) {
        Ok(rent) => rent,
        Err(e) => {
            debug!("Skipping unreadable tennis.ru rent entry: {}", e);
            return None;
        }
    };
    if rent.busy != Some(false) {
        return None;
    }
    let start = parse_local_datetime(&rent.start)?;
    let finish = parse_local_datetime(&rent.finish)?;
    let minutes = u32::try_from((finish - start).num_minutes()).ok()?;

    let slot = CanonicalSlot::new(start, minutes)?
        .with_price(rent.price)
        .with_room(court_id, court_name);
    Some(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VenueCommon;
    use crate::domain::Sport;

    const BODY: &str = r#"{
        "courts": [
            {"id": 11, "name": "Хард 1", "rent_info": [
                {"start": "2025-12-04 07:00:00", "finish": "2025-12-04 08:30:00", "busy": false, "price": 3100},
                {"start": "2025-12-04 08:30:00", "finish": "2025-12-04 09:30:00", "busy": true},
                {"start": "2025-12-04 10:00:00", "finish": "2025-12-04 10:00:00", "busy": false},
                {"start": "2025-12-04 12:00:00", "finish": "2025-12-04 11:00:00", "busy": false},
                {"start": "2025-12-04 13:00:00", "busy": false}
            ]},
            {"id": "12", "name": "Хард 2", "rent_info": [
                {"start": "2025-12-04 07:00:00", "finish": "2025-12-04 08:00:00", "busy": false},
                {"start": "2025-12-04 09:00:00", "finish": "2025-12-04 10:00:00"},
                {"start": "2025-12-04 11:00:00", "finish": "2025-12-04 12:00:00", "busy": null}
            ]}
        ]
    }"#;

    fn venue(courts: Vec<String>) -> TennisRuVenue {
        TennisRuVenue {
            common: VenueCommon {
                id: "tennis-ru-luzhniki".to_string(),
                name: "Лужники".to_string(),
                sport: Sport::Tennis,
                horizon: None,
                delay_ms: None,
                aliases: Vec::new(),
            },
            place_id: "luzhniki".to_string(),
            username: "partner".to_string(),
            password: "secret".to_string(),
            courts,
            base_url: "https://tennis.ru".to_string(),
        }
    }

    fn unit() -> TimeUnit {
        TimeUnit::Day(NaiveDate::from_ymd_opt(2025, 12, 4).unwrap())
    }

    #[test]
    fn test_request_uses_basic_auth() {
        let venue = venue(Vec::new());
        let planned = TennisRuFetcher::new(&venue, 10).plan(unit());
        let request = &planned[0].request;

        assert_eq!(request.url, "https://tennis.ru/api/v2/places/luzhniki/schedule?date=2025-12-04");
        assert_eq!(
            request.basic_auth,
            Some(("partner".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn test_duration_is_wall_clock_difference() {
        let venue = venue(Vec::new());
        let fetcher = TennisRuFetcher::new(&venue, 10);
        let planned = fetcher.plan(unit());

        let slots = fetcher.parse(&planned[0], unit(), BODY).unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].duration, 90);
        assert_eq!(slots[0].price, Some(3100.0));
        assert_eq!(slots[0].room_name, "Хард 1");
        assert_eq!(slots[1].room_key, "12");
        assert_eq!(slots[1].duration, 60);
    }

    #[test]
    fn test_entry_without_busy_flag_is_not_free() {
        let unflagged = serde_json::json!({"start": "2025-12-04 07:00:00", "finish": "2025-12-04 08:00:00"});
        assert!(free_entry(&unflagged, "1", None).is_none());

        let venue = venue(vec!["12".to_string()]);
        let fetcher = TennisRuFetcher::new(&venue, 10);
        let planned = fetcher.plan(unit());
        let slots = fetcher.parse(&planned[0], unit(), BODY).unwrap();

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].time, "07:00");
    }

    #[test]
    fn test_court_allow_list() {
        let venue = venue(vec!["12".to_string()]);
        let fetcher = TennisRuFetcher::new(&venue, 10);
        let planned = fetcher.plan(unit());

        let slots = fetcher.parse(&planned[0], unit(), BODY).unwrap();

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].room_name, "Хард 2");
    }
}
