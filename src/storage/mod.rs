mod bucket;
mod local;

pub use bucket::BucketStore;
pub use local::LocalStore;

use anyhow::{Context, Result};
use log::info;

use crate::config::{ScraperSettings, StorageSettings};
use crate::domain::{AggregatedResult, Sport};

/// Where the per-sport documents live
#[derive(Debug, Clone)]
pub enum Storage {
    Local(LocalStore),
    Bucket(BucketStore),
}

impl Storage {
    /// A bucket when one is configured, the data directory otherwise
    pub fn from_settings(settings: &StorageSettings, scraper: &ScraperSettings) -> Result<Self> {
        let storage = match &settings.bucket {
            Some(bucket) => Storage::Bucket(BucketStore::new(
                bucket,
                settings.access_token.clone(),
                scraper.timeout_secs,
            )?),
            None => Storage::Local(LocalStore::new(&settings.data_dir)),
        };
        info!("Using storage {}", storage.describe());
        Ok(storage)
    }

    pub fn describe(&self) -> String {
        match self {
            Storage::Local(store) => store.dir().display().to_string(),
            Storage::Bucket(store) => format!("gs://{}", store.bucket()),
        }
    }

    /// Replace the document of `sport` with `result`
    pub async fn save(&self, sport: Sport, result: &AggregatedResult) -> Result<()> {
        let name = sport.document_name();
        let json = serde_json::to_string_pretty(result).context("Failed to serialize slots document")?;
        match self {
            Storage::Local(store) => store.write(&name, &json),
            Storage::Bucket(store) => store.write(&name, &json).await,
        }
    }

    /// The last saved document of `sport`, `None` if nothing was saved yet
    pub async fn load(&self, sport: Sport) -> Result<Option<AggregatedResult>> {
        let name = sport.document_name();
        let contents = match self {
            Storage::Local(store) => store.read(&name)?,
            Storage::Bucket(store) => store.read(&name).await?,
        };
        let Some(json) = contents else {
            return Ok(None);
        };
        let result = serde_json::from_str(&json).with_context(|| {
            format!(
                "Failed to parse JSON from {}. First 200 chars: {}",
                name,
                json.chars().take(200).collect::<String>()
            )
        })?;
        Ok(Some(result))
    }
}
