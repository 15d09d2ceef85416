mod clock;
mod structs;

pub use clock::{Clock, ManualClock, SystemClock};
pub use structs::TtlCache;
