//! # Histogram Store
//!
//! Dense 2D count grids, one per ordered pair of dimensions. The whole store
//! is allocated zero-initialized before any record is processed and is only
//! ever mutated by the single orchestrator thread, so no locking is involved.

use serde::{Deserialize, Serialize};

use crate::dimensions::Dimension;
use crate::mpcgrid_errors::MpcGridError;

/// One cell of a grid.
///
/// `count` is monotonically non-decreasing over a run. The start labels are
/// stamped exactly once, from the first record that lands in the cell; by
/// construction every later record in the same cell quantizes to the same
/// labels, so they are never recomputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridEntry {
    pub x: usize,
    pub y: usize,
    #[serde(rename = "sx")]
    pub start_x: String,
    #[serde(rename = "sy")]
    pub start_y: String,
    #[serde(rename = "c")]
    pub count: u32,
    #[serde(rename = "s", default, skip_serializing_if = "String::is_empty")]
    pub special: String,
}

/// Dense 2D table of [`GridEntry`] for one ordered dimension pair.
#[derive(Debug, Clone)]
pub struct Grid {
    size_x: usize,
    size_y: usize,
    cells: Vec<GridEntry>,
}

impl Grid {
    pub fn build(size_x: usize, size_y: usize) -> Self {
        Self {
            size_x,
            size_y,
            cells: vec![GridEntry::default(); size_x * size_y],
        }
    }

    pub fn size_x(&self) -> usize {
        self.size_x
    }

    pub fn size_y(&self) -> usize {
        self.size_y
    }

    fn index(&self, x: usize, y: usize) -> usize {
        x * self.size_y + y
    }

    /// Shared view of one cell. Panics if `(x, y)` is out of bounds.
    pub fn entry(&self, x: usize, y: usize) -> &GridEntry {
        &self.cells[self.index(x, y)]
    }

    /// Mark a cell with a special overlay label (e.g. a major planet sitting
    /// on the diagonal of the semi-major-axis grid). Special cells serialize
    /// even when no record ever lands in them.
    pub fn set_special(&mut self, x: usize, y: usize, marker: &str) {
        let index = self.index(x, y);
        let entry = &mut self.cells[index];
        entry.x = x;
        entry.y = y;
        entry.special = marker.to_string();
    }

    /// Every cell worth emitting: populated or carrying a special marker.
    /// Empty cells are omitted to bound output size on sparse grids.
    pub fn populated(&self) -> Vec<&GridEntry> {
        self.cells
            .iter()
            .filter(|entry| entry.count > 0 || !entry.special.is_empty())
            .collect()
    }
}

/// `N × N` matrix of grids, including the diagonal and both orderings of each
/// off-diagonal pair (the row axis and column axis carry different physical
/// quantities, so `(i, j)` and `(j, i)` are distinct grids).
pub struct ResultTable {
    num_dimensions: usize,
    grids: Vec<Grid>,
}

impl ResultTable {
    /// Allocate all `N²` grids, zero-initialized, sized per dimension pair.
    ///
    /// Arguments
    /// -----------------
    /// * `dimensions` – The registry; every `grid_size` must be positive.
    ///
    /// Return
    /// ----------
    /// * The table, or [`MpcGridError::InvalidDimension`] on a malformed
    ///   registry (checked before any record is processed).
    pub fn build(dimensions: &[Dimension]) -> Result<Self, MpcGridError> {
        if dimensions.is_empty() {
            return Err(MpcGridError::InvalidDimension(
                "no dimensions configured".into(),
            ));
        }
        for dimension in dimensions {
            if dimension.grid_size == 0 {
                return Err(MpcGridError::InvalidDimension(format!(
                    "dimension {} has grid size 0",
                    dimension.name
                )));
            }
        }

        let num_dimensions = dimensions.len();
        let mut grids = Vec::with_capacity(num_dimensions * num_dimensions);
        for row in dimensions {
            for column in dimensions {
                grids.push(Grid::build(row.grid_size, column.grid_size));
            }
        }
        Ok(Self {
            num_dimensions,
            grids,
        })
    }

    pub fn num_dimensions(&self) -> usize {
        self.num_dimensions
    }

    pub fn grid(&self, i: usize, j: usize) -> &Grid {
        &self.grids[i * self.num_dimensions + j]
    }

    pub fn grid_mut(&mut self, i: usize, j: usize) -> &mut Grid {
        &mut self.grids[i * self.num_dimensions + j]
    }

    /// Count one record into cell `(x, y)` of grid `(i, j)`.
    ///
    /// On first occupancy the cell's coordinates and start labels are stamped
    /// from `labels`, which is only invoked then — label formatting is paid
    /// once per cell, not once per record. Returns whether this was the
    /// cell's first occupancy.
    ///
    /// Panics
    /// ----------
    /// * If `(x, y)` is outside the grid; callers resolve coordinates through
    ///   [`Dimension::bin`], which already bounds them.
    pub fn record<F>(&mut self, i: usize, j: usize, x: usize, y: usize, labels: F) -> bool
    where
        F: FnOnce() -> (String, String),
    {
        let grid = &mut self.grids[i * self.num_dimensions + j];
        let index = grid.index(x, y);
        let entry = &mut grid.cells[index];
        entry.count += 1;
        if entry.count == 1 {
            let (start_x, start_y) = labels();
            entry.x = x;
            entry.y = y;
            entry.start_x = start_x;
            entry.start_y = start_y;
            true
        } else {
            false
        }
    }
}
