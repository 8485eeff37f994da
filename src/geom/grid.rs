//! Rectangular grids of 3D points.
//!
//! A [`PointGrid`] is the shape shared by surface samples and bend targets:
//! `rows × columns` points where the row index advances along the first
//! parameter axis (U) and the column index along the second (V).

use super::core::{BBox, Point3};

/// Errors raised when building a [`PointGrid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("point grid has no rows")]
    Empty,
    #[error("row {row} of the point grid is empty")]
    EmptyRow { row: usize },
    #[error("ragged point grid: row {row} has {found} points, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("point grid contains NaN or Inf at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },
}

/// Validated rectangular grid of points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGrid {
    rows: Vec<Vec<Point3>>,
    columns: usize,
}

impl PointGrid {
    /// Validates that `rows` is non-empty, rectangular and finite.
    ///
    /// # Errors
    /// Returns the first violated precondition.
    pub fn new(rows: Vec<Vec<Point3>>) -> Result<Self, GridError> {
        let first = rows.first().ok_or(GridError::Empty)?;
        let columns = first.len();
        if columns == 0 {
            return Err(GridError::EmptyRow { row: 0 });
        }

        for (row_index, row) in rows.iter().enumerate() {
            if row.is_empty() {
                return Err(GridError::EmptyRow { row: row_index });
            }
            if row.len() != columns {
                return Err(GridError::Ragged {
                    row: row_index,
                    expected: columns,
                    found: row.len(),
                });
            }
            if let Some(column) = row.iter().position(|p| !p.is_finite()) {
                return Err(GridError::NonFinite {
                    row: row_index,
                    column,
                });
            }
        }

        Ok(Self { rows, columns })
    }

    /// Builds a grid from nested coordinate arrays.
    ///
    /// # Errors
    /// See [`PointGrid::new`].
    pub fn from_arrays(rows: &[Vec<[f64; 3]>]) -> Result<Self, GridError> {
        Self::new(
            rows.iter()
                .map(|row| row.iter().copied().map(Point3::from).collect())
                .collect(),
        )
    }

    /// Builds a grid by sampling `f(row, column)`.
    ///
    /// # Errors
    /// See [`PointGrid::new`].
    pub fn from_fn(
        rows: usize,
        columns: usize,
        mut f: impl FnMut(usize, usize) -> Point3,
    ) -> Result<Self, GridError> {
        Self::new(
            (0..rows)
                .map(|i| (0..columns).map(|j| f(i, j)).collect())
                .collect(),
        )
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len() * self.columns
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Option<Point3> {
        self.rows.get(row)?.get(column).copied()
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[Point3] {
        &self.rows[row]
    }

    /// Points of one column, top to bottom.
    #[must_use]
    pub fn column(&self, column: usize) -> Vec<Point3> {
        self.rows.iter().map(|row| row[column]).collect()
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Point3]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// All points in row-major order.
    pub fn iter_points(&self) -> impl Iterator<Item = Point3> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    #[must_use]
    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_iter_points(self.iter_points())
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<Point3>> {
        self.rows
    }

    #[must_use]
    pub fn to_arrays(&self) -> Vec<Vec<[f64; 3]>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|p| p.to_array()).collect())
            .collect()
    }
}
