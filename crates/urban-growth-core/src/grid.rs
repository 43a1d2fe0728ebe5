//! Dense 2D grid stored row-major.
//! Occupancy grids use `bool`; probability, weight and time grids use `f64`
//! with `NaN` marking cells that carry no value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `(row, col)` grid coordinate.
pub type Cell = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("grid data has {actual} cells, expected {rows}x{cols}")]
    LengthMismatch {
        rows: usize,
        cols: usize,
        actual: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid<T>")]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// Unchecked wire form; deserialized grids go through [`Grid::from_vec`].
#[derive(Deserialize)]
struct RawGrid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> TryFrom<RawGrid<T>> for Grid<T> {
    type Error = GridError;

    fn try_from(raw: RawGrid<T>) -> Result<Self, Self::Error> {
        Grid::from_vec(raw.rows, raw.cols, raw.data)
    }
}

impl<T: Clone> Grid<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Build a grid from nested rows. All rows must share the first row's width.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n_cols {
                return Err(GridError::RaggedRows {
                    row,
                    expected: n_cols,
                    actual: values.len(),
                });
            }
            data.extend(values);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    pub fn to_rows(&self) -> Vec<Vec<T>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.data.chunks(self.cols).map(<[T]>::to_vec).collect()
    }
}

impl<T> Grid<T> {
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, GridError> {
        if data.len() != rows * cols {
            return Err(GridError::LengthMismatch {
                rows,
                cols,
                actual: data.len(),
            });
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

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn index_of(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols, "cell out of bounds");
        row * self.cols + col
    }

    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[self.index_of(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let idx = self.index_of(row, col);
        self.data[idx] = value;
    }

    /// Row-major iterator over `((row, col), value)`.
    pub fn iter_cells(&self) -> impl Iterator<Item = (Cell, &T)> + '_ {
        let cols = self.cols.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| ((i / cols, i % cols), v))
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Combine two grids of identical shape cell by cell.
    pub fn zip_map<U, V>(&self, other: &Grid<U>, mut f: impl FnMut(&T, &U) -> V) -> Grid<V> {
        assert_eq!(self.shape(), other.shape(), "zip_map requires equal shapes");
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
        }
    }
}

impl Grid<bool> {
    pub fn occupied_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

impl Grid<f64> {
    /// Sum of all non-NaN values.
    pub fn nan_sum(&self) -> f64 {
        self.data.iter().filter(|v| !v.is_nan()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Grid::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert_eq!(
            err,
            GridError::RaggedRows {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Grid::from_vec(2, 3, vec![0u8; 6]).is_ok());
        assert!(matches!(
            Grid::from_vec(2, 3, vec![0u8; 5]),
            Err(GridError::LengthMismatch { actual: 5, .. })
        ));
    }

    #[test]
    fn iter_cells_is_row_major() {
        let g = Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        let cells: Vec<_> = g.iter_cells().map(|(c, &v)| (c, v)).collect();
        assert_eq!(cells[0], ((0, 0), 1));
        assert_eq!(cells[2], ((0, 2), 3));
        assert_eq!(cells[3], ((1, 0), 4));
        assert_eq!(*g.get(1, 2), 6);
        assert_eq!(g.to_rows(), vec![vec![1, 2, 3], vec![4, 5, 6]]);
    }

    #[test]
    fn deserialize_rejects_length_mismatch() {
        let ok: Grid<u8> = serde_json::from_str(r#"{"rows":1,"cols":2,"data":[3,4]}"#).unwrap();
        assert_eq!(*ok.get(0, 1), 4);
        let bad = serde_json::from_str::<Grid<u8>>(r#"{"rows":2,"cols":2,"data":[1,2,3]}"#);
        let err = bad.unwrap_err().to_string();
        assert!(err.contains("expected 2x2"), "{err}");
    }

    #[test]
    fn nan_sum_skips_missing_cells() {
        let g = Grid::from_vec(1, 3, vec![1.0, f64::NAN, 2.5]).unwrap();
        assert_eq!(g.nan_sum(), 3.5);
    }
}
