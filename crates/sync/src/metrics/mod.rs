//! Per-content metric adapters.
//!
//! Each adapter derives a candidate completion percentage from its player's
//! own interaction state. Pure and total: zero-sized content yields 0, and
//! a value may naturally fall when interaction state shrinks (e.g. cards
//! removed by an upstream edit). Monotonicity is the engine's job, never
//! the adapter's.

mod book;
mod deck;
mod hotspots;
mod quiz;
mod video;

use player_core::model::Percentage;

pub use book::BookMetrics;
pub use deck::DeckMetrics;
pub use hotspots::HotspotMetrics;
pub use quiz::QuizMetrics;
pub use video::VideoMetrics;

/// Content-type-specific completion formula.
pub trait CompletionMetric {
    /// Current candidate percentage, clamped to `[0, 100]`.
    fn completion(&self) -> Percentage;
}
