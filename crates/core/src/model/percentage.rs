use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error raised when a raw value does not fit the `[0, 100]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("completion percentage {0} is out of range 0..=100")]
pub struct PercentageError(pub u8);

/// Integer completion percentage in `[0, 100]`.
///
/// All arithmetic helpers clamp rather than fail: a metric adapter must be
/// total, so a zero denominator yields `0` and an overflowing ratio yields
/// `100`.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    pub const ZERO: Self = Self(0);
    pub const COMPLETE: Self = Self(100);

    /// Creates a percentage, rejecting values above 100.
    ///
    /// # Errors
    ///
    /// Returns `PercentageError` if `value > 100`.
    pub fn new(value: u8) -> Result<Self, PercentageError> {
        if value > 100 {
            return Err(PercentageError(value));
        }
        Ok(Self(value))
    }

    /// Creates a percentage by clamping into `[0, 100]`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    /// Computes `round(numerator / denominator * 100)` clamped into range.
    ///
    /// A zero denominator yields `0`; it is an expected state for content
    /// that has no cards, questions, or pages yet.
    #[must_use]
    pub fn from_ratio(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        let scaled = numerator.saturating_mul(100).saturating_add(denominator / 2);
        Self::clamped(i64::try_from(scaled / denominator).unwrap_or(i64::MAX))
    }

    /// Snaps the value down to the nearest multiple of `step`.
    ///
    /// Used for watch milestones, where only every tenth percent counts.
    #[must_use]
    pub fn snapped_down_to(self, step: u8) -> Self {
        if step == 0 {
            return self;
        }
        Self(self.0 / step * step)
    }

    /// Returns the underlying u8 value
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0 == 100
    }
}

impl TryFrom<u8> for Percentage {
    type Error = PercentageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for u8 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

impl fmt::Debug for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Percentage({})", self.0)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
