use chrono::NaiveDateTime;
use std::collections::HashSet;

use super::models::{CanonicalSlot, DateSlotMap};

/// Slots of one venue, deduplicated on (dateTime, room) with the first occurrence kept
pub struct SlotCollection {
    seen: HashSet<(String, String)>,
    slots: Vec<CanonicalSlot>,
    duplicates: usize,
}

impl SlotCollection {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            slots: Vec::new(),
            duplicates: 0,
        }
    }

    /// Returns `false` when an equal key was already collected
    pub fn add(&mut self, slot: CanonicalSlot) -> bool {
        if !self.seen.insert(slot.dedup_key()) {
            self.duplicates += 1;
            return false;
        }
        self.slots.push(slot);
        true
    }

    pub fn extend<I: IntoIterator<Item = CanonicalSlot>>(&mut self, slots: I) {
        for slot in slots {
            self.add(slot);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Group by date, each date ordered by time of day
    pub fn into_date_map(self) -> DateSlotMap {
        let mut map = DateSlotMap::new();
        for slot in self.slots {
            map.entry(slot.date().to_string()).or_default().push(slot);
        }
        for day in map.values_mut() {
            sort_by_time(day);
        }
        map
    }
}

impl Default for SlotCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// Deduplicate and order a single day's slots. Applying it twice changes nothing.
pub fn normalize_day(slots: Vec<CanonicalSlot>) -> Vec<CanonicalSlot> {
    let mut collection = SlotCollection::new();
    collection.extend(slots);
    let mut day = collection.slots;
    sort_by_time(&mut day);
    day
}

/// Fill slots the upstream sent without a price from `price_at`; returns how many were filled.
/// Upstream prices are never replaced.
pub fn fill_missing_prices<F>(map: &mut DateSlotMap, price_at: F) -> usize
where
    F: Fn(NaiveDateTime) -> Option<f64>,
{
    let mut filled = 0;
    for slot in map.values_mut().flatten() {
        if slot.price.is_some() {
            continue;
        }
        if let Some(price) = slot.start().and_then(&price_at) {
            slot.price = Some(price);
            filled += 1;
        }
    }
    filled
}

// "HH:MM" is zero-padded, so string order is chronological order
fn sort_by_time(day: &mut [CanonicalSlot]) {
    day.sort_by(|a, b| a.time.cmp(&b.time));
}
