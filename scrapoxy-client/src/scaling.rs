//! Scaling model.

use serde::{Deserialize, Serialize};

/// Instance counts of a Scrapoxy commander.
///
/// The commander expects `min <= required <= max`; this is not checked
/// before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scaling {
    /// Minimum number of instances.
    pub min: u32,
    /// Number of instances the commander should keep running.
    pub required: u32,
    /// Maximum number of instances.
    pub max: u32,
}

impl Scaling {
    /// Create a scaling triple.
    pub fn new(min: u32, required: u32, max: u32) -> Self {
        Self { min, required, max }
    }

    /// The same bounds with `required` raised to `max`.
    pub fn up(&self) -> Self {
        Self {
            required: self.max,
            ..*self
        }
    }

    /// The same bounds with `required` lowered to `min`.
    pub fn down(&self) -> Self {
        Self {
            required: self.min,
            ..*self
        }
    }

    /// Check `min <= required <= max`.
    pub fn is_ordered(&self) -> bool {
        self.min <= self.required && self.required <= self.max
    }
}
