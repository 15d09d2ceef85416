pub mod ingestion;
pub mod server;

pub use ingestion::{IngestionService, aggregate_sport};
pub use server::ServerService;
