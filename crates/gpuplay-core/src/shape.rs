//! Shape - Matrix Extent
//!
//! A `Shape` is the row/column pair describing a 2-D row-major matrix. Column
//! and row vectors are `n x 1` and `1 x n` shapes, scalars produced by inner
//! products are `1 x 1`.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;

// =============================================================================
// Shape Struct
// =============================================================================

/// Logical extent of a 2-D matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl Shape {
    /// Creates a shape with the given number of rows and columns.
    #[must_use]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// The `1 x 1` shape of an inner product.
    #[must_use]
    pub const fn scalar() -> Self {
        Self::new(1, 1)
    }

    /// A column vector of length `len`.
    #[must_use]
    pub const fn column(len: usize) -> Self {
        Self::new(len, 1)
    }

    /// A row vector of length `len`.
    #[must_use]
    pub const fn row(len: usize) -> Self {
        Self::new(1, len)
    }

    /// Total number of elements.
    #[must_use]
    pub const fn numel(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns true if either extent is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    /// Returns true for `1 x 1`.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    /// Returns true if rows equal cols.
    #[must_use]
    pub const fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// The shape with rows and columns swapped.
    #[must_use]
    pub const fn transposed(&self) -> Self {
        Self::new(self.cols, self.rows)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::new(rows, cols)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

// =============================================================================
// Tests
// =============================================================================
