mod calendar;
mod config;
mod iterator;

pub use calendar::{midnight_timestamp, moscow_offset, parse_local_datetime, today_in_moscow};
pub use config::{Granularity, HorizonConfig};
pub use iterator::{HorizonIterator, TimeUnit};
