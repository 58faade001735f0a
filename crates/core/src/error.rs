use thiserror::Error;

use crate::model::PercentageError;
use crate::model::ids::ParseIdError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Percentage(#[from] PercentageError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
