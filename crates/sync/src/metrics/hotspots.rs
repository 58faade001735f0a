use std::collections::HashSet;

use player_core::model::{HotspotId, Percentage};

use super::CompletionMetric;

/// Interactive video/image state: `round(resolved / total * 100)`.
#[derive(Debug, Clone, Default)]
pub struct HotspotMetrics {
    total_hotspots: u32,
    resolved: HashSet<HotspotId>,
}

impl HotspotMetrics {
    #[must_use]
    pub fn new(total_hotspots: u32) -> Self {
        Self {
            total_hotspots,
            resolved: HashSet::new(),
        }
    }

    /// Record that a hotspot was resolved. Re-resolving counts once.
    pub fn resolve(&mut self, hotspot: HotspotId) {
        self.resolved.insert(hotspot);
    }

    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }
}

impl CompletionMetric for HotspotMetrics {
    fn completion(&self) -> Percentage {
        Percentage::from_ratio(self.resolved.len() as u64, u64::from(self.total_hotspots))
    }
}
