//! Dense N-dimensional matrices of `f64`.
//!
//! A [`Matrix`] stores its shape (`dims`) and a flattened row-major buffer whose
//! length is always the product of the dimensions. The last axis varies fastest:
//! in a `[2, 3]` matrix, index `[1, 2]` lives at offset `1 * 3 + 2 = 5`.
//!
//! ```rust
//! use polycodec::Matrix;
//!
//! let m = Matrix::from_data(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! assert_eq!(m.get(&[1, 2]), Some(6.0));
//! assert_eq!(m.get(&[2, 0]), None);
//! ```

use crate::{Error, Result};

/// A dense row-major matrix with at least one dimension and no zero-sized axis.
#[derive(Clone, Debug)]
pub struct Matrix {
    dims: Vec<usize>,
    data: Vec<f64>,
}

/// Product of all dimensions, rejecting empty shapes, zero axes and overflow.
fn checked_total(dims: &[usize]) -> Result<usize> {
    if dims.is_empty() {
        return Err(Error::invalid_matrix(
            "a matrix needs at least one dimension",
        ));
    }
    dims.iter().try_fold(1usize, |acc, &dim| {
        if dim == 0 {
            return Err(Error::invalid_matrix("dimension sizes must be non-zero"));
        }
        acc.checked_mul(dim)
            .ok_or_else(|| Error::invalid_matrix("total size overflows usize"))
    })
}

impl Matrix {
    /// Creates a zero-filled matrix with the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMatrix`] when `dims` is empty, contains a zero, or
    /// the product of the dimensions overflows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::Matrix;
    ///
    /// let m = Matrix::new(&[3, 4]).unwrap();
    /// assert_eq!(m.total_size(), 12);
    /// assert!(Matrix::new(&[3, 0]).is_err());
    /// assert!(Matrix::new(&[usize::MAX, 2]).is_err());
    /// ```
    pub fn new(dims: &[usize]) -> Result<Self> {
        let total = checked_total(dims)?;
        Ok(Matrix {
            dims: dims.to_vec(),
            data: vec![0.0; total],
        })
    }

    /// Creates a matrix from a shape and a row-major buffer of exactly matching length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMatrix`] on an invalid shape or a buffer whose length
    /// differs from the product of the dimensions.
    pub fn from_data(dims: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let total = checked_total(&dims)?;
        if data.len() != total {
            return Err(Error::InvalidMatrix(format!(
                "expected {} elements, found {}",
                total,
                data.len()
            )));
        }
        Ok(Matrix { dims, data })
    }

    /// Number of elements a matrix of shape `dims` holds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMatrix`] for the shapes [`Matrix::new`] rejects.
    pub fn checked_size(dims: &[usize]) -> Result<usize> {
        checked_total(dims)
    }

    /// Number of dimensions.
    #[inline]
    #[must_use]
    pub fn ndims(&self) -> usize {
        self.dims.len()
    }

    /// Size of one axis, or `None` past the last dimension.
    #[inline]
    #[must_use]
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    #[inline]
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of elements (the product of all dimensions).
    #[inline]
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Row-major offset of a full index vector, or `None` if any axis is out of range.
    #[must_use]
    pub fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0usize;
        for (&i, &dim) in index.iter().zip(&self.dims) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        Some(offset)
    }

    /// Element at `index`, or `None` when the index does not address an element.
    #[must_use]
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.offset(index).map(|offset| self.data[offset])
    }

    /// Overwrites the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] when the index has the wrong number of
    /// axes or any axis is out of range; the matrix is unchanged.
    pub fn set(&mut self, index: &[usize], value: f64) -> Result<()> {
        let Some(offset) = self.offset(index) else {
            // Report the first axis that is out of range, or the rank on a shape mismatch.
            let (index, len) = index
                .iter()
                .zip(&self.dims)
                .find(|&(i, dim)| i >= dim)
                .map_or((index.len(), self.ndims()), |(&i, &dim)| (i, dim));
            return Err(Error::IndexOutOfBounds { index, len });
        };
        self.data[offset] = value;
        Ok(())
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Copies `values` into the buffer from the start, truncating to the matrix size.
    ///
    /// Returns the number of elements copied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::Matrix;
    ///
    /// let mut m = Matrix::new(&[2, 2]).unwrap();
    /// assert_eq!(m.set_data(&[1.0, 2.0, 3.0, 4.0, 5.0]), 4);
    /// assert_eq!(m.data(), &[1.0, 2.0, 3.0, 4.0]);
    /// ```
    pub fn set_data(&mut self, values: &[f64]) -> usize {
        let count = values.len().min(self.data.len());
        self.data[..count].copy_from_slice(&values[..count]);
        count
    }

    /// Splits the matrix into its shape and buffer.
    #[must_use]
    pub fn into_parts(self) -> (Vec<usize>, Vec<f64>) {
        (self.dims, self.data)
    }
}

/// A one-element `[1]` matrix holding `0.0`.
impl Default for Matrix {
    fn default() -> Self {
        Matrix {
            dims: vec![1],
            data: vec![0.0],
        }
    }
}

/// Elements compare by bit pattern, so a decoded matrix equals its source exactly.
impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims
            && self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}
