use chrono::{DateTime, NaiveDateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const UNKNOWN_ROOM: &str = "unknown";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Sport category; one persisted document per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Tennis,
    Padel,
}

impl Sport {
    pub const ALL: [Sport; 2] = [Sport::Tennis, Sport::Padel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Tennis => "tennis",
            Sport::Padel => "padel",
        }
    }

    /// Name of the persisted document for this category
    pub fn document_name(&self) -> String {
        format!("free_slots_{}.json", self.as_str())
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A free, bookable interval at a venue in the shape every source is reduced to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSlot {
    pub time: String,
    pub date_time: String,
    pub duration: u32,
    pub price: Option<f64>,
    pub room_name: String,
    /// Upstream room/court identifier, used only for deduplication
    #[serde(skip)]
    pub room_key: String,
}

impl CanonicalSlot {
    /// Slot starting at `start` (venue-local wall clock); `None` for a zero duration
    pub fn new(start: NaiveDateTime, duration: u32) -> Option<Self> {
        if duration == 0 {
            return None;
        }
        Some(Self {
            time: start.format(TIME_FORMAT).to_string(),
            date_time: start.format(DATE_TIME_FORMAT).to_string(),
            duration,
            price: None,
            room_name: UNKNOWN_ROOM.to_string(),
            room_key: String::new(),
        })
    }

    /// Attach a price; negative or non-finite amounts are treated as absent
    pub fn with_price(mut self, price: Option<f64>) -> Self {
        self.price = price.filter(|p| p.is_finite() && *p >= 0.0);
        self
    }

    pub fn with_room(mut self, key: impl Into<String>, name: Option<&str>) -> Self {
        self.room_key = key.into();
        self.room_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_ROOM)
            .to_string();
        self
    }

    /// Calendar date part of `date_time`
    pub fn date(&self) -> &str {
        self.date_time.get(..10).unwrap_or(&self.date_time)
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date_time, DATE_TIME_FORMAT).ok()
    }

    pub fn dedup_key(&self) -> (String, String) {
        (self.date_time.clone(), self.room_key.clone())
    }
}

/// Date ("YYYY-MM-DD") to slots of that date ordered by time
pub type DateSlotMap = BTreeMap<String, Vec<CanonicalSlot>>;

/// How many time units of a venue were fetched and which ones failed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueFetchStatus {
    pub units_ok: usize,
    pub units_failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_units: Vec<String>,
}

impl VenueFetchStatus {
    pub fn is_complete(&self) -> bool {
        self.units_failed == 0
    }
}

/// The persisted document for one sport category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub last_updated: DateTime<Utc>,
    pub sites: BTreeMap<String, DateSlotMap>,
    #[serde(default)]
    pub status: BTreeMap<String, VenueFetchStatus>,
}

impl AggregatedResult {
    pub fn new(last_updated: DateTime<Utc>) -> Self {
        Self {
            last_updated,
            sites: BTreeMap::new(),
            status: BTreeMap::new(),
        }
    }

    /// Add one venue's slots. Returns `false` and keeps the existing entry if
    /// the venue id is already present.
    pub fn insert_venue(&mut self, venue_id: &str, slots: DateSlotMap, status: VenueFetchStatus) -> bool {
        if self.sites.contains_key(venue_id) {
            return false;
        }
        self.sites.insert(venue_id.to_string(), slots);
        self.status.insert(venue_id.to_string(), status);
        true
    }

    pub fn venue(&self, venue_id: &str) -> Option<&DateSlotMap> {
        self.sites.get(venue_id)
    }

    pub fn total_slots(&self) -> usize {
        self.sites
            .values()
            .flat_map(|dates| dates.values())
            .map(Vec::len)
            .sum()
    }
}
