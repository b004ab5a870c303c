//! Slider levels.

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::{Axis, SLIDER_MIDPOINT};

// ============================================================================
// SliderLevels
// ============================================================================

/// Current level of every proportional axis, in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderLevels {
    levels: [u8; 3],
}

impl SliderLevels {
    /// All axes at the midpoint.
    #[inline]
    #[must_use]
    pub const fn centered() -> Self {
        Self {
            levels: [SLIDER_MIDPOINT; 3],
        }
    }

    /// Returns the level of `axis`.
    #[inline]
    #[must_use]
    pub const fn get(&self, axis: Axis) -> u8 {
        self.levels[index(axis)]
    }

    /// Sets the level of `axis`.
    #[inline]
    pub fn set(&mut self, axis: Axis, level: u8) {
        self.levels[index(axis)] = level;
    }

    /// Returns `true` if every axis sits at the midpoint.
    #[inline]
    #[must_use]
    pub fn is_centered(&self) -> bool {
        self.levels.iter().all(|&level| level == SLIDER_MIDPOINT)
    }
}

impl Default for SliderLevels {
    fn default() -> Self {
        Self::centered()
    }
}

const fn index(axis: Axis) -> usize {
    match axis {
        Axis::Zoom => 0,
        Axis::Tilt => 1,
        Axis::Pan => 2,
    }
}

// ============================================================================
// Tests
// ============================================================================
