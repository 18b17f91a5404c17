//! Tolerance - Floating Point Comparison
//!
//! Backends are free to pick any correct algorithm, so results are compared
//! with an absolute plus relative tolerance rather than bit for bit.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

/// Absolute/relative tolerance for comparing `f32` results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Absolute tolerance.
    pub atol: f32,
    /// Relative tolerance, scaled by the magnitude of the expected value.
    pub rtol: f32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            atol: 1e-5,
            rtol: 1e-4,
        }
    }
}

impl Tolerance {
    /// Creates a tolerance from its absolute and relative parts.
    #[must_use]
    pub const fn new(atol: f32, rtol: f32) -> Self {
        Self { atol, rtol }
    }

    /// Tolerance used for GPU backends, whose shaders may fuse or reorder
    /// floating point operations.
    #[must_use]
    pub const fn gpu() -> Self {
        Self::new(1e-4, 1e-3)
    }

    /// The looser of two tolerances, component-wise.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.atol.max(other.atol), self.rtol.max(other.rtol))
    }

    /// Returns true if `actual` is within tolerance of `expected`.
    #[must_use]
    pub fn is_close(&self, actual: f32, expected: f32) -> bool {
        if actual == expected {
            return true;
        }
        (actual - expected).abs() <= self.atol + self.rtol * expected.abs()
    }

    /// Returns true if both slices have the same length and every pair of
    /// elements is within tolerance.
    #[must_use]
    pub fn all_close(&self, actual: &[f32], expected: &[f32]) -> bool {
        actual.len() == expected.len()
            && actual
                .iter()
                .zip(expected)
                .all(|(&a, &e)| self.is_close(a, e))
    }
}

// =============================================================================
// Tests
// =============================================================================
