use serde::{Deserialize, Serialize};

/// Authentication state reported by the host application.
///
/// Only the boolean distinction matters to progress reconciliation; the
/// anonymous → authenticated transition forces a re-bootstrap, the reverse
/// does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    Anonymous,
    Authenticated,
}

impl Identity {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated)
    }
}
