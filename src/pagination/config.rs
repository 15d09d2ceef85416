use chrono::NaiveDate;

/// Size of the step a source pages through its schedule with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    /// Inclusive date ranges of at most this many days
    Range(u32),
}

/// Configuration for walking a venue's horizon
#[derive(Debug, Clone)]
pub struct HorizonConfig {
    pub start: NaiveDate,
    /// Days ahead for `Day`/`Range`, weeks ahead for `Week`
    pub length: u32,
    pub granularity: Granularity,
}

impl HorizonConfig {
    pub fn days(start: NaiveDate, length: u32) -> Self {
        Self {
            start,
            length,
            granularity: Granularity::Day,
        }
    }

    pub fn weeks(start: NaiveDate, length: u32) -> Self {
        Self {
            start,
            length,
            granularity: Granularity::Week,
        }
    }

    pub fn ranges(start: NaiveDate, days: u32, chunk_days: u32) -> Self {
        Self {
            start,
            length: days,
            granularity: Granularity::Range(chunk_days.max(1)),
        }
    }

    /// Number of units the horizon is split into
    pub fn unit_count(&self) -> usize {
        let length = self.length as usize;
        match self.granularity {
            Granularity::Day | Granularity::Week => length,
            Granularity::Range(chunk) => length.div_ceil(chunk as usize),
        }
    }
}
