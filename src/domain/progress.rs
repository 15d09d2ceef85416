use log::{info, warn};

use super::models::VenueFetchStatus;

/// Track which time units of a venue fetch succeeded
pub struct FetchProgress {
    venue_id: String,
    total: usize,
    ok: usize,
    failed: Vec<String>,
    slots: usize,
}

impl FetchProgress {
    pub fn new(venue_id: &str, total: usize) -> Self {
        Self {
            venue_id: venue_id.to_string(),
            total,
            ok: 0,
            failed: Vec::new(),
            slots: 0,
        }
    }

    pub fn record_ok(&mut self, unit: &str, slot_count: usize) {
        self.ok += 1;
        self.slots += slot_count;
        log_unit(&self.venue_id, unit, slot_count);
        self.log_progress();
    }

    pub fn record_failed(&mut self, unit: &str, error: &anyhow::Error) {
        warn!("  {} {}: fetch failed: {:#}", self.venue_id, unit, error);
        self.failed.push(unit.to_string());
        self.log_progress();
    }

    pub fn current_count(&self) -> usize {
        self.ok + self.failed.len()
    }

    pub fn slot_count(&self) -> usize {
        self.slots
    }

    pub fn into_status(self) -> VenueFetchStatus {
        VenueFetchStatus {
            units_ok: self.ok,
            units_failed: self.failed.len(),
            failed_units: self.failed,
        }
    }

    fn log_progress(&self) {
        let current = self.current_count();
        if is_complete(current, self.total) {
            info!(
                "  → {}: {}/{} units ({} failed), {} slots",
                self.venue_id,
                current,
                self.total,
                self.failed.len(),
                self.slots
            );
        }
    }
}

fn log_unit(venue_id: &str, unit: &str, slot_count: usize) {
    log::debug!("  {} {}: {} free slots", venue_id, unit, slot_count);
}

fn is_complete(current: usize, total: usize) -> bool {
    current == total
}
