use chrono::{Datelike, Days, NaiveDate};
use std::fmt;

use super::config::{Granularity, HorizonConfig};

/// One request's worth of schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Day(NaiveDate),
    /// Week identified by its Monday
    Week(NaiveDate),
    /// Inclusive date range
    Range(NaiveDate, NaiveDate),
}

impl TimeUnit {
    pub fn first_day(&self) -> NaiveDate {
        match self {
            TimeUnit::Day(day) | TimeUnit::Week(day) | TimeUnit::Range(day, _) => *day,
        }
    }

    pub fn last_day(&self) -> NaiveDate {
        match self {
            TimeUnit::Day(day) => *day,
            TimeUnit::Week(monday) => *monday + Days::new(6),
            TimeUnit::Range(_, to) => *to,
        }
    }

    /// Whether `date` falls inside this unit
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day() <= date && date <= self.last_day()
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Day(day) => write!(f, "{}", day),
            TimeUnit::Week(monday) => write!(f, "week of {}", monday),
            TimeUnit::Range(from, to) => write!(f, "{}..{}", from, to),
        }
    }
}

/// Iterator over the time units of a horizon, nearest first
pub struct HorizonIterator {
    config: HorizonConfig,
    current: usize,
}

impl HorizonIterator {
    pub fn new(config: HorizonConfig) -> Self {
        Self { config, current: 0 }
    }

    fn unit_at(&self, index: usize) -> Option<TimeUnit> {
        let start = self.config.start;
        match self.config.granularity {
            Granularity::Day => start.checked_add_days(Days::new(index as u64)).map(TimeUnit::Day),
            Granularity::Week => {
                let monday = start - Days::new(start.weekday().num_days_from_monday() as u64);
                monday
                    .checked_add_days(Days::new(7 * index as u64))
                    .map(TimeUnit::Week)
            }
            Granularity::Range(chunk) => {
                let offset = index as u64 * chunk as u64;
                let remaining = (self.config.length as u64).saturating_sub(offset);
                let span = remaining.min(chunk as u64).saturating_sub(1);
                let from = start.checked_add_days(Days::new(offset))?;
                let to = from.checked_add_days(Days::new(span))?;
                Some(TimeUnit::Range(from, to))
            }
        }
    }
}

impl Iterator for HorizonIterator {
    type Item = TimeUnit;

    fn next(&mut self) -> Option<TimeUnit> {
        if self.current >= self.config.unit_count() {
            return None;
        }
        let unit = self.unit_at(self.current)?;
        self.current += 1;
        Some(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_start_today() {
        let units: Vec<TimeUnit> = HorizonIterator::new(HorizonConfig::days(date(2025, 12, 30), 3)).collect();
        assert_eq!(
            units,
            vec![
                TimeUnit::Day(date(2025, 12, 30)),
                TimeUnit::Day(date(2025, 12, 31)),
                TimeUnit::Day(date(2026, 1, 1)),
            ]
        );
    }

    #[test]
    fn test_weeks_are_aligned_to_monday() {
        // 2025-12-04 is a Thursday
        let units: Vec<TimeUnit> = HorizonIterator::new(HorizonConfig::weeks(date(2025, 12, 4), 2)).collect();
        assert_eq!(units, vec![TimeUnit::Week(date(2025, 12, 1)), TimeUnit::Week(date(2025, 12, 8))]);
        assert_eq!(units[0].last_day(), date(2025, 12, 7));
    }

    #[test]
    fn test_ranges_cover_horizon_without_overlap() {
        let units: Vec<TimeUnit> = HorizonIterator::new(HorizonConfig::ranges(date(2025, 12, 1), 14, 7)).collect();
        assert_eq!(
            units,
            vec![
                TimeUnit::Range(date(2025, 12, 1), date(2025, 12, 7)),
                TimeUnit::Range(date(2025, 12, 8), date(2025, 12, 14)),
            ]
        );
    }

    #[test]
    fn test_last_range_is_truncated() {
        let units: Vec<TimeUnit> = HorizonIterator::new(HorizonConfig::ranges(date(2025, 12, 1), 10, 7)).collect();
        assert_eq!(units.len(), 2);
        assert_eq!(units[1], TimeUnit::Range(date(2025, 12, 8), date(2025, 12, 10)));
    }

    #[test]
    fn test_unit_label() {
        assert_eq!(TimeUnit::Week(date(2025, 12, 1)).to_string(), "week of 2025-12-01");
        assert_eq!(TimeUnit::Day(date(2025, 12, 1)).to_string(), "2025-12-01");
    }
}
