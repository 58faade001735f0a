//! Async orchestration around the reconciliation engine.
//!
//! The service executes the effects the engine requests: fetches and writes
//! go to the gateway on spawned tasks, lock expirations run on a scheduled
//! timer owned by the store entry. Network results are applied back only if
//! the mount that requested them still exists (check-before-apply, not
//! abort), so teardown never races a callback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, warn};

use gateway::{GatewayError, InteractionEvent, SyncGateway};
use player_core::Clock;
use player_core::model::{ContentId, Identity, InstanceId, Percentage, ProgressRecord};

use crate::engine::{Effect, ReconciliationEngine};
use crate::error::SyncError;
use crate::store::{ProgressStore, SessionEntry};
use crate::task::ScheduledTask;

/// How long a pending milestone suppresses duplicate writes.
const DEFAULT_LOCK_WINDOW: Duration = Duration::from_secs(5);

/// Drives progress reconciliation for every mounted content player.
///
/// Cheap to clone; all clones share one store and one gateway. Must be used
/// inside a tokio runtime, since effect execution spawns tasks.
#[derive(Clone)]
pub struct ProgressSyncService {
    gateway: Arc<dyn SyncGateway>,
    store: Arc<Mutex<ProgressStore>>,
    clock: Clock,
    lock_window: Duration,
}

impl ProgressSyncService {
    #[must_use]
    pub fn new(gateway: Arc<dyn SyncGateway>) -> Self {
        Self {
            gateway,
            store: Arc::new(Mutex::new(ProgressStore::new())),
            clock: Clock::default_clock(),
            lock_window: DEFAULT_LOCK_WINDOW,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Override the 5-second deduplication window (tests use short ones).
    #[must_use]
    pub fn with_lock_window(mut self, window: Duration) -> Self {
        self.lock_window = window;
        self
    }

    /// A content player mounted.
    ///
    /// Creates fresh reconciliation state and bootstraps it: anonymous
    /// sessions become ready immediately, authenticated ones fetch their
    /// stored record first. Mounting the same content again replaces the
    /// old state and strands its in-flight callbacks.
    pub fn mount(&self, content_id: ContentId, identity: Identity) -> InstanceId {
        let instance = InstanceId::new();
        let mut engine = ReconciliationEngine::new(identity);
        let effects = engine.start();

        let mut store = self.store();
        store.insert(content_id, SessionEntry::new(instance, engine));
        self.run_effects(&mut store, content_id, instance, effects);
        instance
    }

    /// A content player unmounted. Drops its state and expiry timer.
    ///
    /// Returns false if nothing was mounted for this content.
    pub fn unmount(&self, content_id: ContentId) -> bool {
        self.store().remove(content_id)
    }

    /// A metric adapter recomputed its completion percentage.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotMounted` if no player is mounted for the
    /// content.
    pub fn report_candidate(
        &self,
        content_id: ContentId,
        candidate: Percentage,
    ) -> Result<(), SyncError> {
        self.with_engine(content_id, |engine| engine.candidate(candidate))
    }

    /// Explicit full-completion event (e.g. "quiz submitted").
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotMounted` if no player is mounted for the
    /// content.
    pub fn report_completion(&self, content_id: ContentId) -> Result<(), SyncError> {
        self.with_engine(content_id, ReconciliationEngine::complete)
    }

    /// The identity signal changed; delivered to every mounted player.
    pub fn identity_changed(&self, identity: Identity) {
        let mut store = self.store();
        let pending: Vec<_> = store
            .iter_mut()
            .map(|(content_id, entry)| {
                (
                    content_id,
                    entry.instance,
                    entry.engine.identity_changed(identity),
                )
            })
            .collect();
        for (content_id, instance, effects) in pending {
            self.run_effects(&mut store, content_id, instance, effects);
        }
    }

    /// Display value for the UI: the current high-water mark, if known.
    #[must_use]
    pub fn high_water_mark(&self, content_id: ContentId) -> Option<Percentage> {
        self.store()
            .get(content_id)
            .and_then(|entry| entry.engine.high_water_mark().get())
    }

    /// Append an analytics event. Fire-and-forget; never gates progress.
    pub fn record_interaction(
        &self,
        content_id: ContentId,
        name: impl Into<String>,
        payload: serde_json::Value,
    ) {
        let event = InteractionEvent::new(name, payload, self.clock.now());
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(err) = service.gateway.record_interaction(content_id, event).await {
                debug!("interaction event for content {content_id} dropped: {err}");
            }
        });
    }

    fn store(&self) -> MutexGuard<'_, ProgressStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_engine(
        &self,
        content_id: ContentId,
        apply: impl FnOnce(&mut ReconciliationEngine) -> Vec<Effect>,
    ) -> Result<(), SyncError> {
        let mut store = self.store();
        let Some(entry) = store.get_mut(content_id) else {
            return Err(SyncError::NotMounted(content_id));
        };
        let instance = entry.instance;
        let effects = apply(&mut entry.engine);
        self.run_effects(&mut store, content_id, instance, effects);
        Ok(())
    }

    /// Apply a fetch result back into the owning mount, if it still exists.
    fn apply_fetch_result(
        &self,
        content_id: ContentId,
        instance: InstanceId,
        result: Result<Option<ProgressRecord>, GatewayError>,
    ) {
        let mut store = self.store();
        let Some(entry) = store.get_mut(content_id) else {
            debug!("discarding fetch result for unmounted content {content_id}");
            return;
        };
        if !entry.accepts(instance) {
            debug!("discarding fetch result for stale mount of content {content_id}");
            return;
        }
        let effects = match result {
            Ok(record) => entry.engine.fetch_resolved(record.as_ref()),
            Err(err) => {
                debug!("progress fetch for content {content_id} failed: {err}");
                entry.engine.fetch_failed()
            }
        };
        self.run_effects(&mut store, content_id, instance, effects);
    }

    fn expire_lock(&self, content_id: ContentId, instance: InstanceId, milestone: Percentage) {
        let mut store = self.store();
        let Some(entry) = store.get_mut(content_id) else {
            return;
        };
        if !entry.accepts(instance) {
            return;
        }
        entry.engine.lock_expired(milestone);
        entry.expiry = None;
    }

    fn run_effects(
        &self,
        store: &mut ProgressStore,
        content_id: ContentId,
        instance: InstanceId,
        effects: Vec<Effect>,
    ) {
        for effect in effects {
            match effect {
                Effect::Fetch => {
                    let service = self.clone();
                    tokio::spawn(async move {
                        let result = service.gateway.fetch_progress(content_id).await;
                        service.apply_fetch_result(content_id, instance, result);
                    });
                }
                Effect::Write(milestone) => {
                    // Rearming replaces (and thereby cancels) a previous timer.
                    if let Some(entry) = store.get_mut(content_id) {
                        let service = self.clone();
                        entry.expiry = Some(ScheduledTask::once(self.lock_window, async move {
                            service.expire_lock(content_id, instance, milestone);
                        }));
                    }
                    let service = self.clone();
                    tokio::spawn(async move {
                        if let Err(err) =
                            service.gateway.write_progress(content_id, milestone).await
                        {
                            // Not retried here: the lock expiry plus the next
                            // qualifying candidate re-attempts naturally.
                            warn!(
                                "progress write {milestone} for content {content_id} failed: {err}"
                            );
                        }
                    });
                }
                Effect::CancelExpiry => {
                    if let Some(entry) = store.get_mut(content_id) {
                        entry.expiry = None;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::InMemoryGateway;

    fn pct(v: i64) -> Percentage {
        Percentage::clamped(v)
    }

    fn service_with(gateway: &InMemoryGateway) -> ProgressSyncService {
        ProgressSyncService::new(Arc::new(gateway.clone()))
            .with_lock_window(Duration::from_millis(40))
    }

    #[tokio::test]
    async fn anonymous_mount_is_ready_without_fetching() {
        let gateway = InMemoryGateway::new();
        let service = service_with(&gateway);
        let content_id = ContentId::new(1);

        service.mount(content_id, Identity::Anonymous);
        service.report_candidate(content_id, pct(25)).unwrap();

        assert_eq!(service.high_water_mark(content_id), Some(pct(25)));
        assert_eq!(gateway.fetch_count(), 0);
    }

    #[tokio::test]
    async fn reporting_for_unmounted_content_is_an_error() {
        let gateway = InMemoryGateway::new();
        let service = service_with(&gateway);
        let result = service.report_candidate(ContentId::new(9), pct(10));
        assert!(matches!(result, Err(SyncError::NotMounted(_))));
        assert_eq!(service.high_water_mark(ContentId::new(9)), None);
    }

    #[tokio::test]
    async fn unmount_discards_state() {
        let gateway = InMemoryGateway::new();
        let service = service_with(&gateway);
        let content_id = ContentId::new(2);

        service.mount(content_id, Identity::Anonymous);
        service.report_candidate(content_id, pct(50)).unwrap();
        assert!(service.unmount(content_id));
        assert!(!service.unmount(content_id));
        assert_eq!(service.high_water_mark(content_id), None);
    }

    #[tokio::test]
    async fn remount_replaces_the_previous_instance() {
        let gateway = InMemoryGateway::new();
        let service = service_with(&gateway);
        let content_id = ContentId::new(3);

        let first = service.mount(content_id, Identity::Anonymous);
        service.report_candidate(content_id, pct(70)).unwrap();
        let second = service.mount(content_id, Identity::Anonymous);

        assert_ne!(first, second);
        // fresh state: the old mark is gone
        assert_eq!(service.high_water_mark(content_id), None);
    }

    #[tokio::test]
    async fn interactions_are_forwarded_with_a_timestamp() {
        let gateway = InMemoryGateway::new();
        let service = service_with(&gateway).with_clock(player_core::time::fixed_clock());
        let content_id = ContentId::new(4);

        service.record_interaction(content_id, "card_flipped", serde_json::json!({"card": 1}));
        tokio::time::sleep(Duration::from_millis(40)).await;

        let events = gateway.recorded_interactions();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1.name, "card_flipped");
        assert_eq!(events[0].1.occurred_at, player_core::time::fixed_now());
    }
}
