mod collection;
pub mod models;
mod progress;

pub use collection::{SlotCollection, fill_missing_prices, normalize_day};
pub use models::*;
pub use progress::FetchProgress;
