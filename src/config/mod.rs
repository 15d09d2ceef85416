mod loader;
pub mod pricing;
pub mod settings;
pub mod venues;

pub use loader::{ConfigLoader, StaticConfig};
pub use pricing::{PriceRange, PricingTable, VenuePricing, WorkingHours};
pub use settings::{AppConfig, RegistrySettings, ResolverSettings, ScraperSettings, StorageSettings};
pub use venues::{
    FindSportVenue, MoyKlassVenue, ReserviFormat, ReserviVenue, SourceKind, StaffMode, StaffSelector,
    Tennis77Venue, TennisRuVenue, VenueCommon, VenueConfig, VenueRegistry, VivaVenue, YClientsVenue,
};
