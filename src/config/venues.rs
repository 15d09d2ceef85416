use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::domain::Sport;
use crate::errors::parse_context;

/// Booking platform a venue is fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Reservi,
    #[serde(rename = "yclients")]
    YClients,
    #[serde(rename = "vivacrm")]
    VivaCrm,
    #[serde(rename = "moyklass")]
    MoyKlass,
    #[serde(rename = "findsport")]
    FindSport,
    Tennis77,
    TennisRu,
}

impl SourceKind {
    /// Days ahead (weeks for MoyKlass) fetched when a venue sets no horizon
    pub fn default_horizon(&self) -> u32 {
        match self {
            SourceKind::Reservi => 14,
            SourceKind::YClients => 7,
            SourceKind::VivaCrm => 10,
            SourceKind::MoyKlass => 2,
            SourceKind::FindSport => 7,
            SourceKind::Tennis77 => 14,
            SourceKind::TennisRu => 10,
        }
    }

    /// Pause between two requests to the same upstream
    pub fn default_delay_ms(&self) -> u64 {
        match self {
            SourceKind::Reservi => 300,
            SourceKind::YClients => 200,
            SourceKind::VivaCrm => 200,
            SourceKind::MoyKlass => 300,
            SourceKind::FindSport => 100,
            SourceKind::Tennis77 => 300,
            SourceKind::TennisRu => 200,
        }
    }
}

/// Fields every venue has regardless of platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueCommon {
    pub id: String,
    pub name: String,
    pub sport: Sport,
    #[serde(default)]
    pub horizon: Option<u32>,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    /// Extra spellings the name resolver should recognise
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReserviFormat {
    #[default]
    ServiceId,
    SalonId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserviVenue {
    #[serde(flatten)]
    pub common: VenueCommon,
    pub base_url: String,
    pub api_key: String,
    pub club_id: String,
    #[serde(default)]
    pub format: ReserviFormat,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub salon_id: Option<String>,
    #[serde(default = "default_duration")]
    pub default_duration: u32,
    #[serde(default)]
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffMode {
    /// No `staff_id` key in the request
    Omitted,
    /// `"staff_id": null` in the request
    Null,
}

/// How a YClients request selects a staff member (court)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaffSelector {
    Mode(StaffMode),
    /// One request per staff id; values are room names
    Rooms(BTreeMap<String, String>),
}

impl Default for StaffSelector {
    fn default() -> Self {
        StaffSelector::Mode(StaffMode::Omitted)
    }
}

/// A literal `"staff": null` means the same as `"staff": "null"`
fn staff_or_null<'de, D>(deserializer: D) -> std::result::Result<StaffSelector, D::Error>
where
    D: Deserializer<'de>,
{
    let selector = Option::<StaffSelector>::deserialize(deserializer)?;
    Ok(selector.unwrap_or(StaffSelector::Mode(StaffMode::Null)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YClientsVenue {
    #[serde(flatten)]
    pub common: VenueCommon,
    pub location_id: u64,
    pub token: String,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default, deserialize_with = "staff_or_null")]
    pub staff: StaffSelector,
    #[serde(default = "default_yclients_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VivaVenue {
    #[serde(flatten)]
    pub common: VenueCommon,
    pub tenant_id: String,
    pub service_id: String,
    #[serde(default = "default_viva_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoyKlassVenue {
    #[serde(flatten)]
    pub common: VenueCommon,
    pub page_url: String,
    #[serde(default)]
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindSportVenue {
    #[serde(flatten)]
    pub common: VenueCommon,
    pub playground_id: u64,
    /// Court id to room name; courts missing here keep their id as name
    #[serde(default)]
    pub courts: BTreeMap<String, String>,
    #[serde(default = "default_findsport_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tennis77Venue {
    #[serde(flatten)]
    pub common: VenueCommon,
    pub club_id: String,
    #[serde(default = "default_chunk_days")]
    pub chunk_days: u32,
    #[serde(default = "default_tennis77_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TennisRuVenue {
    #[serde(flatten)]
    pub common: VenueCommon,
    pub place_id: String,
    pub username: String,
    pub password: String,
    /// Only these court ids are reported; empty means all
    #[serde(default)]
    pub courts: Vec<String>,
    #[serde(default = "default_tennis_ru_url")]
    pub base_url: String,
}

/// Per-platform venue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum VenueConfig {
    Reservi(ReserviVenue),
    #[serde(rename = "yclients")]
    YClients(YClientsVenue),
    #[serde(rename = "vivacrm")]
    VivaCrm(VivaVenue),
    #[serde(rename = "moyklass")]
    MoyKlass(MoyKlassVenue),
    #[serde(rename = "findsport")]
    FindSport(FindSportVenue),
    Tennis77(Tennis77Venue),
    TennisRu(TennisRuVenue),
}

impl VenueConfig {
    pub fn common(&self) -> &VenueCommon {
        match self {
            VenueConfig::Reservi(v) => &v.common,
            VenueConfig::YClients(v) => &v.common,
            VenueConfig::VivaCrm(v) => &v.common,
            VenueConfig::MoyKlass(v) => &v.common,
            VenueConfig::FindSport(v) => &v.common,
            VenueConfig::Tennis77(v) => &v.common,
            VenueConfig::TennisRu(v) => &v.common,
        }
    }

    pub fn source(&self) -> SourceKind {
        match self {
            VenueConfig::Reservi(_) => SourceKind::Reservi,
            VenueConfig::YClients(_) => SourceKind::YClients,
            VenueConfig::VivaCrm(_) => SourceKind::VivaCrm,
            VenueConfig::MoyKlass(_) => SourceKind::MoyKlass,
            VenueConfig::FindSport(_) => SourceKind::FindSport,
            VenueConfig::Tennis77(_) => SourceKind::Tennis77,
            VenueConfig::TennisRu(_) => SourceKind::TennisRu,
        }
    }

    pub fn id(&self) -> &str {
        &self.common().id
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn sport(&self) -> Sport {
        self.common().sport
    }

    pub fn horizon(&self) -> u32 {
        self.common()
            .horizon
            .unwrap_or_else(|| self.source().default_horizon())
    }

    pub fn delay_ms(&self) -> u64 {
        self.common()
            .delay_ms
            .unwrap_or_else(|| self.source().default_delay_ms())
    }

    fn validate(&self) -> Result<()> {
        if let VenueConfig::Reservi(venue) = self {
            let target = match venue.format {
                ReserviFormat::ServiceId => &venue.service_id,
                ReserviFormat::SalonId => &venue.salon_id,
            };
            if target.is_none() {
                anyhow::bail!(
                    "Venue '{}' uses the {:?} format but does not set the matching id",
                    venue.common.id,
                    venue.format
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    venues: Vec<VenueConfig>,
}

/// Every configured venue, with identifiers unique across platforms
#[derive(Debug, Clone, Default)]
pub struct VenueRegistry {
    venues: Vec<VenueConfig>,
}

impl VenueRegistry {
    pub fn new(venues: Vec<VenueConfig>) -> Result<Self> {
        Self::ensure_unique_ids(&venues)?;
        for venue in &venues {
            venue.validate()?;
        }
        Ok(Self { venues })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(json).context(parse_context("venue registry"))?;
        Self::new(file.venues)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read venue registry {}", path.display()))?;
        let registry = Self::from_json(&json)?;
        info!("Loaded {} venues from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn all(&self) -> &[VenueConfig] {
        &self.venues
    }

    pub fn by_sport(&self, sport: Sport) -> impl Iterator<Item = &VenueConfig> {
        self.venues.iter().filter(move |venue| venue.sport() == sport)
    }

    pub fn get(&self, id: &str) -> Option<&VenueConfig> {
        self.venues.iter().find(|venue| venue.id() == id)
    }

    /// (venue id, name) for every display name and alias
    pub fn name_table(&self) -> Vec<(String, String)> {
        self.venues
            .iter()
            .flat_map(|venue| {
                let common = venue.common();
                std::iter::once(&common.name)
                    .chain(common.aliases.iter())
                    .map(move |name| (common.id.clone(), name.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    fn ensure_unique_ids(venues: &[VenueConfig]) -> Result<()> {
        let mut seen: HashMap<&str, SourceKind> = HashMap::new();
        for venue in venues {
            if let Some(previous) = seen.insert(venue.id(), venue.source()) {
                anyhow::bail!(
                    "Venue id '{}' is configured twice ({:?} and {:?})",
                    venue.id(),
                    previous,
                    venue.source()
                );
            }
        }
        Ok(())
    }
}

fn default_duration() -> u32 {
    60
}

fn default_chunk_days() -> u32 {
    7
}

fn default_yclients_url() -> String {
    "https://platform.yclients.com".to_string()
}

fn default_viva_url() -> String {
    "https://api.vivacrm.ru".to_string()
}

fn default_findsport_url() -> String {
    "https://findsport.ru".to_string()
}

fn default_tennis77_url() -> String {
    "https://tennis77.ru".to_string()
}

fn default_tennis_ru_url() -> String {
    "https://api.tennis.ru".to_string()
}
