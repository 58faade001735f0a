use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use player_core::model::{ContentId, LearnerId, Percentage, ProgressRecord};

/// Errors surfaced by sync gateways.
///
/// Nothing here is fatal to a caller: the reconciliation engine treats a
/// failed fetch as "no record" and recovers failed writes through lock
/// expiry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("gateway responded with status {0}")]
    Status(u16),

    #[error("malformed gateway payload: {0}")]
    Protocol(String),
}

/// Auxiliary analytics event, appended to the interaction log.
///
/// Never read back by the progress logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub name: String,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl InteractionEvent {
    #[must_use]
    pub fn new(name: impl Into<String>, payload: serde_json::Value, occurred_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            payload,
            occurred_at,
        }
    }
}

/// Contract for the remote store of record.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Fetch the stored progress for a content item.
    ///
    /// `None` is the normal answer for first-time access. Idempotent and
    /// side-effect free; may be called many times per session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend cannot be reached or answers
    /// with a non-success status other than not-found.
    async fn fetch_progress(
        &self,
        content_id: ContentId,
    ) -> Result<Option<ProgressRecord>, GatewayError>;

    /// Report a completion percentage.
    ///
    /// The backend is expected (not guaranteed) to store
    /// `max(existing, percentage)`, which makes duplicate writes harmless.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the write does not reach the backend.
    async fn write_progress(
        &self,
        content_id: ContentId,
        percentage: Percentage,
    ) -> Result<(), GatewayError>;

    /// Append an analytics event. Best effort; never gates progress.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the event cannot be delivered.
    async fn record_interaction(
        &self,
        content_id: ContentId,
        event: InteractionEvent,
    ) -> Result<(), GatewayError>;
}

/// In-memory gateway for tests and prototyping.
///
/// Behaves like a well-behaved backend: writes max-merge into the stored
/// record, fetches are side-effect free. Call counters and a failure toggle
/// let tests exercise the engine's failure semantics.
#[derive(Clone)]
pub struct InMemoryGateway {
    learner_id: LearnerId,
    records: Arc<Mutex<HashMap<ContentId, ProgressRecord>>>,
    interactions: Arc<Mutex<Vec<(ContentId, InteractionEvent)>>>,
    writes: Arc<Mutex<Vec<(ContentId, Percentage)>>>,
    fetch_calls: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
    fail_fetches: Arc<AtomicBool>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::for_learner(LearnerId::new(0))
    }

    #[must_use]
    pub fn for_learner(learner_id: LearnerId) -> Self {
        Self {
            learner_id,
            records: Arc::new(Mutex::new(HashMap::new())),
            interactions: Arc::new(Mutex::new(Vec::new())),
            writes: Arc::new(Mutex::new(Vec::new())),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            fail_fetches: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pre-populate a stored record, as if written in an earlier session.
    pub fn seed(&self, record: ProgressRecord) {
        let mut guard = lock_or_clear(&self.records);
        guard.insert(record.content_id, record);
    }

    /// Stored percentage for a content item, if any.
    #[must_use]
    pub fn stored_percentage(&self, content_id: ContentId) -> Option<Percentage> {
        lock_or_clear(&self.records)
            .get(&content_id)
            .map(|r| r.completion_percentage)
    }

    /// Every `write_progress` call observed, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<(ContentId, Percentage)> {
        lock_or_clear(&self.writes).clone()
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn recorded_interactions(&self) -> Vec<(ContentId, InteractionEvent)> {
        lock_or_clear(&self.interactions).clone()
    }

    /// Make subsequent writes fail, simulating an unreachable backend.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent fetches fail, simulating an unreachable backend.
    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }
}

fn lock_or_clear<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl SyncGateway for InMemoryGateway {
    async fn fetch_progress(
        &self,
        content_id: ContentId,
    ) -> Result<Option<ProgressRecord>, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("simulated fetch failure".into()));
        }
        Ok(lock_or_clear(&self.records).get(&content_id).cloned())
    }

    async fn write_progress(
        &self,
        content_id: ContentId,
        percentage: Percentage,
    ) -> Result<(), GatewayError> {
        lock_or_clear(&self.writes).push((content_id, percentage));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("simulated write failure".into()));
        }
        let mut guard = lock_or_clear(&self.records);
        let record = guard
            .entry(content_id)
            .or_insert_with(|| ProgressRecord::new(content_id, self.learner_id, Percentage::ZERO));
        if percentage > record.completion_percentage {
            record.completion_percentage = percentage;
            if percentage.is_complete() {
                record.completed_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn record_interaction(
        &self,
        content_id: ContentId,
        event: InteractionEvent,
    ) -> Result<(), GatewayError> {
        lock_or_clear(&self.interactions).push((content_id, event));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_core::time::fixed_now;

    fn pct(v: i64) -> Percentage {
        Percentage::clamped(v)
    }

    #[tokio::test]
    async fn writes_max_merge_into_stored_record() {
        let gateway = InMemoryGateway::new();
        let content_id = ContentId::new(1);

        gateway.write_progress(content_id, pct(40)).await.unwrap();
        gateway.write_progress(content_id, pct(25)).await.unwrap();

        assert_eq!(gateway.stored_percentage(content_id), Some(pct(40)));
        assert_eq!(gateway.writes().len(), 2);
    }

    #[tokio::test]
    async fn completing_write_stamps_completed_at() {
        let gateway = InMemoryGateway::new();
        let content_id = ContentId::new(2);

        gateway.write_progress(content_id, pct(100)).await.unwrap();

        let record = gateway.fetch_progress(content_id).await.unwrap().unwrap();
        assert!(record.is_complete());
        assert!(record.completed_at.is_some());
    }

    #[tokio::test]
    async fn fetch_of_unknown_content_is_absent_not_error() {
        let gateway = InMemoryGateway::new();
        let fetched = gateway.fetch_progress(ContentId::new(9)).await.unwrap();
        assert!(fetched.is_none());
        assert_eq!(gateway.fetch_count(), 1);
    }

    #[tokio::test]
    async fn simulated_failures_surface_as_unavailable() {
        let gateway = InMemoryGateway::new();
        gateway.set_fail_fetches(true);
        gateway.set_fail_writes(true);

        let fetch = gateway.fetch_progress(ContentId::new(1)).await;
        assert!(matches!(fetch, Err(GatewayError::Unavailable(_))));

        let write = gateway.write_progress(ContentId::new(1), pct(10)).await;
        assert!(matches!(write, Err(GatewayError::Unavailable(_))));
        // failed writes are still counted as attempts
        assert_eq!(gateway.writes().len(), 1);
    }

    #[tokio::test]
    async fn interactions_append_in_order() {
        let gateway = InMemoryGateway::new();
        let content_id = ContentId::new(3);
        for name in ["card_flipped", "card_flipped", "deck_completed"] {
            gateway
                .record_interaction(
                    content_id,
                    InteractionEvent::new(name, serde_json::json!({}), fixed_now()),
                )
                .await
                .unwrap();
        }

        let events = gateway.recorded_interactions();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].1.name, "deck_completed");
    }
}
