use crate::error::{Result, SaccadeError};
use serde::{Deserialize, Serialize};

/// Row-major rectangular matrix. Rows are trials, columns are time samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Matrix<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Builds a matrix from nested rows. Ragged input is rejected.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(SaccadeError::ShapeMismatch {
                    context: "matrix rows",
                    expected: format!("{cols} columns"),
                    actual: format!("{} columns in row {i}", row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }
}

impl<T> Matrix<T> {
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| SaccadeError::Config(format!("{rows}x{cols} overflows")))?;
        if data.len() != expected {
            return Err(SaccadeError::shape_mismatch(
                "matrix buffer",
                expected,
                data.len(),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow row `index`, failing with `OutOfRange` past the last trial.
    pub fn row(&self, index: usize) -> Result<&[T]> {
        if index >= self.rows {
            return Err(SaccadeError::OutOfRange {
                index,
                len: self.rows,
            });
        }
        let start = index * self.cols;
        Ok(&self.data[start..start + self.cols])
    }

    pub fn row_mut(&mut self, index: usize) -> Result<&mut [T]> {
        if index >= self.rows {
            return Err(SaccadeError::OutOfRange {
                index,
                len: self.rows,
            });
        }
        let start = index * self.cols;
        Ok(&mut self.data[start..start + self.cols])
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks_exact(0) panics, so zero-width matrices yield empty rows by hand
        let cols = self.cols.max(1);
        let empty = self.cols == 0;
        (0..self.rows).map(move |i| {
            if empty {
                &self.data[0..0]
            } else {
                &self.data[i * cols..(i + 1) * cols]
            }
        })
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Fails with `ShapeMismatch` unless `other` has the same shape.
    pub fn ensure_same_shape<U>(&self, other: &Matrix<U>, context: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(SaccadeError::shape_mismatch(
                context,
                format!("{}x{}", self.rows, self.cols),
                format!("{}x{}", other.rows, other.cols),
            ));
        }
        Ok(())
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}
