#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod metrics;
pub mod service;
pub mod store;
pub mod task;

pub use player_core::Clock;

pub use engine::{Effect, HighWaterMark, Phase, ReconciliationEngine};
pub use error::SyncError;
pub use metrics::{
    BookMetrics, CompletionMetric, DeckMetrics, HotspotMetrics, QuizMetrics, VideoMetrics,
};
pub use service::ProgressSyncService;
pub use store::{ProgressStore, SessionEntry};
pub use task::ScheduledTask;
