use anyhow::Result;
use std::sync::Arc;

use super::pricing::PricingTable;
use super::settings::RegistrySettings;
use super::venues::VenueRegistry;
use crate::cache::{Clock, SystemClock, TtlCache};
use crate::resolver::VenueResolver;

const STATIC_CONFIG_KEY: &str = "static";

/// Venue registry and pricing tables as loaded together from disk, plus the
/// name index built over that registry
#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub registry: VenueRegistry,
    pub pricing: PricingTable,
    pub resolver: VenueResolver,
}

impl StaticConfig {
    pub fn new(registry: VenueRegistry, pricing: PricingTable) -> Self {
        let resolver = VenueResolver::from_registry(&registry);
        Self {
            registry,
            pricing,
            resolver,
        }
    }

    pub fn load(settings: &RegistrySettings) -> Result<Self> {
        let registry = VenueRegistry::load(&settings.venues_path)?;
        let pricing = PricingTable::load_optional(&settings.pricing_path)?;
        Ok(Self::new(registry, pricing))
    }
}

/// Loads static configuration at most once per TTL
pub struct ConfigLoader {
    settings: RegistrySettings,
    cache: TtlCache<&'static str, Arc<StaticConfig>>,
}

impl ConfigLoader {
    pub fn new(settings: RegistrySettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: RegistrySettings, clock: Arc<dyn Clock>) -> Self {
        let cache = TtlCache::with_clock(settings.ttl, clock);
        Self { settings, cache }
    }

    pub fn get(&mut self) -> Result<Arc<StaticConfig>> {
        let settings = &self.settings;
        self.cache
            .get_or_try_insert_with(STATIC_CONFIG_KEY, || StaticConfig::load(settings).map(Arc::new))
    }

    /// Force the next `get` to read from disk
    pub fn invalidate(&mut self) {
        self.cache.invalidate(&STATIC_CONFIG_KEY);
    }
}
