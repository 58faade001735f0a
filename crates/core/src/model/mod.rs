pub mod ids;
mod identity;
mod percentage;
mod progress;

pub use ids::{CardId, ContentId, HotspotId, InstanceId, LearnerId, QuestionId};

pub use identity::Identity;
pub use percentage::{Percentage, PercentageError};
pub use progress::ProgressRecord;
