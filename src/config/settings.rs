use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub user_agent: &'static str,
    pub timeout_secs: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; CourtSlots/1.0)",
            timeout_secs: 30,
        }
    }
}

/// Where aggregated documents are kept
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Cloud Storage bucket; when unset documents go to `data_dir`
    pub bucket: Option<String>,
    pub data_dir: PathBuf,
    pub access_token: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: None,
            data_dir: PathBuf::from("data"),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub threshold: f64,
    pub debug_top: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            debug_top: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub venues_path: PathBuf,
    pub pricing_path: PathBuf,
    pub ttl: Duration,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            venues_path: PathBuf::from("config/venues.json"),
            pricing_path: PathBuf::from("config/pricing.json"),
            ttl: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub scraper: ScraperSettings,
    pub storage: StorageSettings,
    pub resolver: ResolverSettings,
    pub registry: RegistrySettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        config.storage.bucket = non_empty("SLOTS_BUCKET");
        config.storage.access_token = non_empty("GCS_ACCESS_TOKEN");
        if let Some(dir) = non_empty("SLOTS_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = non_empty("VENUES_PATH") {
            config.registry.venues_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty("PRICING_PATH") {
            config.registry.pricing_path = PathBuf::from(path);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_use_local_storage() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert!(config.storage.bucket.is_none());
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert_eq!(config.resolver.threshold, 0.25);
        assert_eq!(config.registry.ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_bucket_from_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SLOTS_BUCKET", "court-slots"),
            ("VENUES_PATH", "/etc/court_slots/venues.json"),
        ]));
        assert_eq!(config.storage.bucket.as_deref(), Some("court-slots"));
        assert_eq!(config.registry.venues_path, PathBuf::from("/etc/court_slots/venues.json"));
    }

    #[test]
    fn test_blank_bucket_is_ignored() {
        let config = AppConfig::from_lookup(lookup_from(&[("SLOTS_BUCKET", "  ")]));
        assert!(config.storage.bucket.is_none());
    }
}
