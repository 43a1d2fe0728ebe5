//! Connected-component labeling of occupied cells and the rural/urban split.
//!
//! Labels are assigned in row-major discovery order starting at 1; label 0 is
//! background. Callers should only rely on labels for grouping.

use crate::grid::{Cell, Grid};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One connected component of occupied cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub label: u32,
    pub area: usize,
    /// Mean `(row, col)` of member cells.
    pub centroid: [f64; 2],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementKind {
    Unsettled,
    Rural,
    Urban,
}

impl SettlementKind {
    /// Signed code used by the settlement type matrix: urban +1, rural -1, unsettled 0.
    pub fn code(self) -> i8 {
        match self {
            SettlementKind::Urban => 1,
            SettlementKind::Rural => -1,
            SettlementKind::Unsettled => 0,
        }
    }
}

/// Clusters split by area threshold.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterPartition {
    pub rural: Vec<ClusterRecord>,
    pub urban: Vec<ClusterRecord>,
}

/// Every grid cell assigned to exactly one class, each list in row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPartition {
    pub rural: Vec<Cell>,
    pub urban: Vec<Cell>,
    pub unsettled: Vec<Cell>,
}

const NEIGHBORS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Label 4-connected components of occupied cells.
pub fn label_clusters(grid: &Grid<bool>) -> Grid<u32> {
    let (rows, cols) = grid.shape();
    let mut labels = Grid::filled(rows, cols, 0u32);
    let mut next_label = 0u32;
    let mut queue = VecDeque::new();

    for ((row, col), &occupied) in grid.iter_cells() {
        if !occupied || *labels.get(row, col) != 0 {
            continue;
        }
        next_label += 1;
        labels.set(row, col, next_label);
        queue.push_back((row, col));

        while let Some((r, c)) = queue.pop_front() {
            for (dr, dc) in NEIGHBORS {
                let (Some(nr), Some(nc)) = (r.checked_add_signed(dr), c.checked_add_signed(dc))
                else {
                    continue;
                };
                if nr >= rows || nc >= cols {
                    continue;
                }
                if *grid.get(nr, nc) && *labels.get(nr, nc) == 0 {
                    labels.set(nr, nc, next_label);
                    queue.push_back((nr, nc));
                }
            }
        }
    }
    labels
}

/// Area and centroid per label, indexed by `label - 1`.
pub fn cluster_records(labels: &Grid<u32>) -> Vec<ClusterRecord> {
    let n = labels.data().iter().copied().max().unwrap_or(0) as usize;
    let mut areas = vec![0usize; n];
    let mut sums = vec![[0.0f64; 2]; n];
    for ((row, col), &label) in labels.iter_cells() {
        if label == 0 {
            continue;
        }
        let idx = label as usize - 1;
        areas[idx] += 1;
        sums[idx][0] += row as f64;
        sums[idx][1] += col as f64;
    }
    areas
        .into_iter()
        .zip(sums)
        .enumerate()
        .map(|(idx, (area, sum))| ClusterRecord {
            label: idx as u32 + 1,
            area,
            centroid: [sum[0] / area as f64, sum[1] / area as f64],
        })
        .collect()
}

/// Clusters with `area >= threshold` are urban; smaller ones are rural.
#[inline]
pub fn kind_for_area(area: usize, threshold: f64) -> SettlementKind {
    if area as f64 >= threshold {
        SettlementKind::Urban
    } else {
        SettlementKind::Rural
    }
}

pub fn classify_clusters(grid: &Grid<bool>, threshold: f64) -> ClusterPartition {
    let labels = label_clusters(grid);
    let mut partition = ClusterPartition::default();
    for record in cluster_records(&labels) {
        match kind_for_area(record.area, threshold) {
            SettlementKind::Urban => partition.urban.push(record),
            _ => partition.rural.push(record),
        }
    }
    partition
}

/// Per-cell settlement class.
pub fn classify_kinds(grid: &Grid<bool>, threshold: f64) -> Grid<SettlementKind> {
    let labels = label_clusters(grid);
    let kinds: Vec<SettlementKind> = cluster_records(&labels)
        .iter()
        .map(|r| kind_for_area(r.area, threshold))
        .collect();
    labels.map(|&label| match label {
        0 => SettlementKind::Unsettled,
        l => kinds[l as usize - 1],
    })
}

pub fn classify_cells(grid: &Grid<bool>, threshold: f64) -> CellPartition {
    let mut partition = CellPartition::default();
    for (cell, kind) in classify_kinds(grid, threshold).iter_cells() {
        match kind {
            SettlementKind::Rural => partition.rural.push(cell),
            SettlementKind::Urban => partition.urban.push(cell),
            SettlementKind::Unsettled => partition.unsettled.push(cell),
        }
    }
    partition
}

/// +1 urban, -1 rural, 0 unsettled.
pub fn settlement_type_matrix(grid: &Grid<bool>, threshold: f64) -> Grid<i8> {
    classify_kinds(grid, threshold).map(|k| k.code())
}
