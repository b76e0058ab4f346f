use std::error::Error;
use std::fmt;

/// Dense row-major matrix of factor vectors, one row per entity.
///
/// `dim == 0` is a legal shape: every row is the empty slice and every dot
/// product over it scores `0.0`. The row count is therefore carried
/// explicitly instead of being derived from the buffer length.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

/// Error type for factor-matrix construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// Returned when the flat buffer length does not equal `rows * dim`.
    ShapeMismatch { rows: usize, dim: usize, len: usize },
    /// Returned when a row does not match the width of the first row.
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { rows, dim, len } => {
                write!(
                    f,
                    "buffer of {len} values cannot hold {rows} rows of width {dim}"
                )
            }
            Self::RaggedRow { row, expected, got } => {
                write!(f, "row {row} has width {got}, expected {expected}")
            }
        }
    }
}

impl Error for MatrixError {}

impl FactorMatrix {
    /// Builds a matrix from a flat row-major buffer with an explicit shape.
    pub fn from_flat(rows: usize, dim: usize, data: Vec<f32>) -> Result<Self, MatrixError> {
        let expected = rows.checked_mul(dim).ok_or(MatrixError::ShapeMismatch {
            rows,
            dim,
            len: data.len(),
        })?;
        if data.len() != expected {
            return Err(MatrixError::ShapeMismatch {
                rows,
                dim,
                len: data.len(),
            });
        }
        Ok(Self { rows, dim, data })
    }

    /// Builds a matrix by copying a slice of equal-width rows.
    ///
    /// An empty slice yields the `0 x 0` matrix.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, MatrixError> {
        let dim = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * dim);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != dim {
                return Err(MatrixError::RaggedRow {
                    row,
                    expected: dim,
                    got: values.len(),
                });
            }
            data.extend_from_slice(values);
        }
        Ok(Self {
            rows: rows.len(),
            dim,
            data,
        })
    }

    /// Returns the number of entity rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the shared row width.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns true when the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns the factor vector of one row.
    ///
    /// `index` must be below [`FactorMatrix::rows`].
    pub fn row(&self, index: usize) -> &[f32] {
        debug_assert!(index < self.rows);
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    /// Returns the flat row-major buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
