use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::parse_context;

/// Hourly rate for hours in `[start_hour, end_hour)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub start_hour: u32,
    pub end_hour: u32,
    pub price: f64,
}

impl PriceRange {
    fn contains(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }
}

/// Opening hours, `open` inclusive and `close` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub open: u32,
    pub close: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenuePricing {
    #[serde(default)]
    pub weekday: Vec<PriceRange>,
    #[serde(default)]
    pub weekend: Vec<PriceRange>,
    #[serde(default)]
    pub working_hours: Option<WorkingHours>,
}

impl VenuePricing {
    /// Rate for a slot starting at the given Moscow wall-clock time
    pub fn price_at(&self, start: NaiveDateTime) -> Option<f64> {
        let hour = start.hour();
        if let Some(hours) = self.working_hours {
            if hour < hours.open || hour >= hours.close {
                return None;
            }
        }
        let ranges = if is_weekend(start.weekday()) {
            &self.weekend
        } else {
            &self.weekday
        };
        ranges
            .iter()
            .find(|range| range.contains(hour))
            .map(|range| range.price)
    }
}

/// Static price tables keyed by venue id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingTable {
    venues: HashMap<String, VenuePricing>,
}

impl PricingTable {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context(parse_context("pricing table"))
    }

    /// Missing file means no venue has a price table
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pricing table {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn venue(&self, venue_id: &str) -> Option<&VenuePricing> {
        self.venues.get(venue_id)
    }

    pub fn price_at(&self, venue_id: &str, start: NaiveDateTime) -> Option<f64> {
        self.venue(venue_id)?.price_at(start)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}
