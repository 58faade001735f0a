use player_core::model::Percentage;

use super::CompletionMetric;

const WATCH_MILESTONE_STEP: u8 = 10;

/// Video playback state: `round(position / duration * 100)` snapped down to
/// the nearest multiple of 10 — a "watch milestone".
///
/// The playhead is recomputed many times per second during playback and may
/// seek backwards; the snapping keeps the candidate stream coarse.
#[derive(Debug, Clone, Default)]
pub struct VideoMetrics {
    position_seconds: u32,
    duration_seconds: u32,
}

impl VideoMetrics {
    #[must_use]
    pub fn new(duration_seconds: u32) -> Self {
        Self {
            position_seconds: 0,
            duration_seconds,
        }
    }

    /// Playhead moved (tick or seek, either direction).
    pub fn set_position(&mut self, seconds: u32) {
        self.position_seconds = seconds;
    }

    #[must_use]
    pub fn position_seconds(&self) -> u32 {
        self.position_seconds
    }
}

impl CompletionMetric for VideoMetrics {
    fn completion(&self) -> Percentage {
        Percentage::from_ratio(
            u64::from(self.position_seconds),
            u64::from(self.duration_seconds),
        )
        .snapped_down_to(WATCH_MILESTONE_STEP)
    }
}
