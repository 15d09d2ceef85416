use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::LazyLock;

use super::{PlannedRequest, SourceFetcher, value_to_key};
use crate::config::VivaVenue;
use crate::domain::{CanonicalSlot, DATE_FORMAT};
use crate::errors::parse_context;
use crate::http::UpstreamRequest;
use crate::pagination::{HorizonConfig, TimeUnit, parse_local_datetime};

const NO_TRAINER: &str = "NO_TRAINER";

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?$").unwrap());

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VivaSlot {
    time_from: String,
    duration: String,
    #[serde(default)]
    price: Option<PriceRange>,
    #[serde(default)]
    room_id: Option<Value>,
    #[serde(default)]
    room_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceRange {
    #[serde(default)]
    from: Option<f64>,
}

/// VivaCRM end-user API; one trainer-less timeslot search per day
pub struct VivaFetcher<'a> {
    venue: &'a VivaVenue,
    horizon: u32,
}

impl<'a> VivaFetcher<'a> {
    pub fn new(venue: &'a VivaVenue, horizon: u32) -> Self {
        Self { venue, horizon }
    }

    fn url(&self) -> String {
        format!(
            "{}/end-user/api/v1/{}/products/master-services/{}/timeslots",
            self.venue.base_url.trim_end_matches('/'),
            self.venue.tenant_id,
            self.venue.service_id
        )
    }
}

impl SourceFetcher for VivaFetcher<'_> {
    fn horizon(&self, today: NaiveDate) -> HorizonConfig {
        HorizonConfig::days(today, self.horizon)
    }

    fn plan(&self, unit: TimeUnit) -> Vec<PlannedRequest> {
        let body = json!({
            "date": unit.first_day().format(DATE_FORMAT).to_string(),
            "trainers": { "type": NO_TRAINER },
        });
        vec![PlannedRequest::new(UpstreamRequest::post_json(self.url(), body))]
    }

    fn parse(&self, _planned: &PlannedRequest, _unit: TimeUnit, body: &str) -> Result<Vec<CanonicalSlot>> {
        let response: Value = serde_json::from_str(body).context(parse_context("vivacrm timeslots"))?;
        if let Some(message) = response.get("error").filter(|e| !e.is_null()) {
            anyhow::bail!("vivacrm returned an error: {}", message);
        }
        Ok(parse_timeslots(&response))
    }
}

fn parse_timeslots(response: &Value) -> Vec<CanonicalSlot> {
    let groups = response
        .pointer(&format!("/byTrainer/{}/slots", NO_TRAINER))
        .and_then(Value::as_array);
    let Some(groups) = groups else {
        return Vec::new();
    };

    groups
        .iter()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|item| match serde_json::from_value::<VivaSlot>(item.clone()) {
            Ok(slot) => to_canonical(slot),
            Err(e) => {
                debug!("Skipping unreadable vivacrm slot: {}", e);
                None
            }
        })
        .collect()
}

fn to_canonical(slot: VivaSlot) -> Option<CanonicalSlot> {
    let start = parse_local_datetime(&slot.time_from)?;
    let duration = parse_iso_duration(&slot.duration)?;
    let room_key = slot
        .room_id
        .as_ref()
        .and_then(value_to_key)
        .or_else(|| slot.room_name.clone())
        .unwrap_or_default();
    let canonical = CanonicalSlot::new(start, duration)?
        .with_price(slot.price.and_then(|p| p.from))
        .with_room(room_key, slot.room_name.as_deref());
    Some(canonical)
}

/// Minutes in an ISO-8601 time duration such as "PT1H30M"; `None` when unparseable or zero
pub fn parse_iso_duration(token: &str) -> Option<u32> {
    let captures = ISO_DURATION.captures(token.trim())?;
    let hours = captures.get(1).map(|m| m.as_str().parse::<u32>()).transpose().ok()?;
    let minutes = captures.get(2).map(|m| m.as_str().parse::<u32>()).transpose().ok()?;
    if hours.is_none() && minutes.is_none() {
        return None;
    }
    let total = hours.unwrap_or(0).checked_mul(60)?.checked_add(minutes.unwrap_or(0))?;
    (total > 0).then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VenueCommon;
    use crate::domain::Sport;

    fn venue() -> VivaVenue {
        VivaVenue {
            common: VenueCommon {
                id: "viva-tennis".to_string(),
                name: "Viva Tennis".to_string(),
                sport: Sport::Tennis,
                horizon: None,
                delay_ms: None,
                aliases: Vec::new(),
            },
            tenant_id: "iSkq6G".to_string(),
            service_id: "a1b2".to_string(),
            base_url: "https://api.vivacrm.ru".to_string(),
        }
    }

    #[test]
    fn test_iso_duration() {
        assert_eq!(parse_iso_duration("PT1H"), Some(60));
        assert_eq!(parse_iso_duration("PT1H30M"), Some(90));
        assert_eq!(parse_iso_duration("PT90M"), Some(90));
        assert_eq!(parse_iso_duration("PT2H"), Some(120));
        assert_eq!(parse_iso_duration("PT"), None);
        assert_eq!(parse_iso_duration("PT0M"), None);
        assert_eq!(parse_iso_duration("1 hour"), None);
    }

    #[test]
    fn test_iso_duration_out_of_range() {
        assert_eq!(parse_iso_duration("PT4294967295H"), None);
        assert_eq!(parse_iso_duration("PT71582788H59M"), None);
        assert_eq!(parse_iso_duration("PT99999999999M"), None);
    }

    #[test]
    fn test_request_shape() {
        let venue = venue();
        let fetcher = VivaFetcher::new(&venue, 10);
        let unit = TimeUnit::Day(NaiveDate::from_ymd_opt(2025, 12, 4).unwrap());
        let planned = fetcher.plan(unit);
        let request = &planned[0].request;

        assert_eq!(
            request.url,
            "https://api.vivacrm.ru/end-user/api/v1/iSkq6G/products/master-services/a1b2/timeslots"
        );
        assert_eq!(
            request.json_body(),
            Some(&json!({"date": "2025-12-04", "trainers": {"type": "NO_TRAINER"}}))
        );
    }

    #[test]
    fn test_nested_slot_groups_are_flattened() {
        let venue = venue();
        let fetcher = VivaFetcher::new(&venue, 10);
        let unit = TimeUnit::Day(NaiveDate::from_ymd_opt(2025, 12, 4).unwrap());
        let planned = fetcher.plan(unit);
        let body = r#"{
            "byTrainer": {
                "NO_TRAINER": {
                    "slots": [
                        [
                            {"timeFrom": "2025-12-04T07:00:00+03:00", "duration": "PT1H", "price": {"from": 2500, "to": 3000}, "roomId": 3, "roomName": "Корт 3"},
                            {"timeFrom": "2025-12-04T08:00:00+03:00", "duration": "PT1H30M", "price": {"from": 2700, "to": 3200}, "roomName": "Корт 3"}
                        ],
                        [
                            {"timeFrom": "2025-12-04T09:00:00+03:00", "duration": "soon"},
                            {"duration": "PT1H"}
                        ]
                    ]
                }
            }
        }"#;

        let slots = fetcher.parse(&planned[0], unit, body).unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].time, "07:00");
        assert_eq!(slots[0].duration, 60);
        assert_eq!(slots[0].price, Some(2500.0));
        assert_eq!(slots[0].room_key, "3");
        assert_eq!(slots[1].duration, 90);
        assert_eq!(slots[1].room_name, "Корт 3");
    }

    #[test]
    fn test_missing_trainer_group_means_no_slots() {
        let venue = venue();
        let fetcher = VivaFetcher::new(&venue, 10);
        let unit = TimeUnit::Day(NaiveDate::from_ymd_opt(2025, 12, 4).unwrap());
        let planned = fetcher.plan(unit);

        let slots = fetcher.parse(&planned[0], unit, r#"{"byTrainer": {}}"#).unwrap();
        assert!(slots.is_empty());
    }
}
