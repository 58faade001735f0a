//! Keyed container for per-mount reconciliation state.
//!
//! One entry per active content instance; no cross-instance sharing, no
//! persistence. The store owns each mount's expiry timer so that removing
//! an entry provably cancels it.

use std::collections::HashMap;

use player_core::model::{ContentId, InstanceId};

use crate::engine::ReconciliationEngine;
use crate::task::ScheduledTask;

/// Reconciliation state for one mounted player.
#[derive(Debug)]
pub struct SessionEntry {
    pub instance: InstanceId,
    pub engine: ReconciliationEngine,
    pub expiry: Option<ScheduledTask>,
}

impl SessionEntry {
    #[must_use]
    pub fn new(instance: InstanceId, engine: ReconciliationEngine) -> Self {
        Self {
            instance,
            engine,
            expiry: None,
        }
    }

    /// True if a callback minted for `instance` still belongs to this entry.
    #[must_use]
    pub fn accepts(&self, instance: InstanceId) -> bool {
        self.instance == instance
    }
}

/// All mounted players, keyed by content.
#[derive(Debug, Default)]
pub struct ProgressStore {
    entries: HashMap<ContentId, SessionEntry>,
}

impl ProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, content_id: ContentId) -> Option<&SessionEntry> {
        self.entries.get(&content_id)
    }

    pub fn get_mut(&mut self, content_id: ContentId) -> Option<&mut SessionEntry> {
        self.entries.get_mut(&content_id)
    }

    /// Insert or replace the entry for a content item.
    ///
    /// Replacing drops the previous entry, cancelling its expiry timer; the
    /// fresh instance id makes callbacks from the old mount stale.
    pub fn insert(&mut self, content_id: ContentId, entry: SessionEntry) {
        self.entries.insert(content_id, entry);
    }

    /// Remove the entry, cancelling its expiry timer via drop.
    pub fn remove(&mut self, content_id: ContentId) -> bool {
        self.entries.remove(&content_id).is_some()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ContentId, &mut SessionEntry)> {
        self.entries.iter_mut().map(|(id, entry)| (*id, entry))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
