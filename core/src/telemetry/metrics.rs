use std::sync::Mutex;

/// Point-in-time view of the poll counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub kpi_updates: usize,
    pub location_updates: usize,
    pub position_pushes: usize,
    pub errors: usize,
}

/// Counters for the background pollers. Errors never stop the timers, so
/// this is the only place failed ticks are visible.
pub struct PollMetrics {
    inner: Mutex<PollStats>,
}

impl PollMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PollStats::default()),
        }
    }

    pub fn record_kpi_update(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            stats.kpi_updates += 1;
        }
    }

    pub fn record_location_update(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            stats.location_updates += 1;
        }
    }

    pub fn record_position_push(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            stats.position_pushes += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            stats.errors += 1;
        }
    }

    pub fn snapshot(&self) -> PollStats {
        self.inner.lock().map(|stats| *stats).unwrap_or_default()
    }
}

impl Default for PollMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = PollMetrics::new();
        metrics.record_kpi_update();
        metrics.record_kpi_update();
        metrics.record_error();
        let stats = metrics.snapshot();
        assert_eq!(stats.kpi_updates, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.location_updates, 0);
    }
}
