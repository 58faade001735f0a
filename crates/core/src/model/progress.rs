use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ContentId, LearnerId};
use super::percentage::Percentage;

/// Server-durable progress record for one (learner, content) pair.
///
/// The store of record is expected, but not guaranteed, to keep
/// `completion_percentage` monotone across writes; clients compensate with a
/// local high-water mark and must never interpret a lower value as a
/// regression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub content_id: ContentId,
    pub learner_id: LearnerId,
    pub completion_percentage: Percentage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(
        content_id: ContentId,
        learner_id: LearnerId,
        completion_percentage: Percentage,
    ) -> Self {
        Self {
            content_id,
            learner_id,
            completion_percentage,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completion_percentage.is_complete()
    }
}
