use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::config::{AppConfig, ConfigLoader, StaticConfig};
use crate::domain::{AggregatedResult, Sport, fill_missing_prices};
use crate::fetchers::fetch_venue;
use crate::http::RateLimitedClient;
use crate::pagination::today_in_moscow;
use crate::storage::Storage;

/// One scheduled run: every venue of the requested sports, fetched in turn and saved per sport
pub struct IngestionService {
    loader: ConfigLoader,
    client: RateLimitedClient,
    storage: Storage,
}

impl IngestionService {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = RateLimitedClient::new(config.scraper.user_agent, config.scraper.timeout_secs, 0)?;
        let storage = Storage::from_settings(&config.storage, &config.scraper)?;
        Ok(Self {
            loader: ConfigLoader::new(config.registry),
            client,
            storage,
        })
    }

    pub async fn run(&mut self, sports: &[Sport]) -> Result<()> {
        info!("=== Starting Slot Ingestion ===\n");

        // Step 1: Load venues and pricing
        let static_config = self.loader.get()?;
        info!("  → {} venues, {} price tables\n", static_config.registry.len(), static_config.pricing.len());

        for &sport in sports {
            // Step 2: Fetch every venue of the sport
            let result = aggregate_sport(&mut self.client, &static_config, sport, Utc::now()).await;
            info!(
                "  → {}: {} slots across {} venues\n",
                sport,
                result.total_slots(),
                result.sites.len()
            );

            // Step 3: Replace the stored document
            self.storage.save(sport, &result).await?;
        }

        info!("=== Ingestion Complete ({} upstream requests) ===", self.client.request_count());
        Ok(())
    }
}

/// Fetch all venues of `sport` and fold them into one document stamped `now`
pub async fn aggregate_sport(
    client: &mut RateLimitedClient,
    static_config: &StaticConfig,
    sport: Sport,
    now: DateTime<Utc>,
) -> AggregatedResult {
    info!("Fetching {} venues...", sport);
    let today = today_in_moscow(now);
    let mut result = AggregatedResult::new(now);

    for venue in static_config.registry.by_sport(sport) {
        let fetch = fetch_venue(client, venue, today).await;
        let mut slots = fetch.slots.into_date_map();

        let filled = fill_missing_prices(&mut slots, |start| static_config.pricing.price_at(venue.id(), start));
        if filled > 0 {
            info!("  {}: priced {} slots from the rate table", venue.id(), filled);
        }

        if !fetch.status.is_complete() {
            warn!(
                "  {}: {} of {} units failed",
                venue.id(),
                fetch.status.units_failed,
                fetch.status.units_ok + fetch.status.units_failed
            );
        }
        if !result.insert_venue(venue.id(), slots, fetch.status) {
            warn!("  {}: already collected in this run, keeping the first result", venue.id());
        }
    }

    result
}
