//! Shared error types for the sync crate.

use thiserror::Error;

use player_core::model::ContentId;

/// Errors emitted by `ProgressSyncService`.
///
/// Gateway failures never appear here: fetch failures degrade to "no
/// record" and write failures are recovered through lock expiry, per the
/// engine's failure semantics.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("no mounted player for content {0}")]
    NotMounted(ContentId),
}
