//! Compressed distance fields from unsettled cells to the rural and urban classes.

use crate::cluster::{classify_clusters, classify_cells, ClusterRecord};
use crate::grid::{Cell, Grid};
use crate::spatial;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an unsettled cell measures its distance to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Every member cell of the class.
    #[default]
    Full,
    /// One centroid per cluster of the class.
    Centroid,
}

/// Integer-truncated distances grouped into `(distance, count)` bins, ascending by distance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceHistogram {
    bins: Vec<(u32, u32)>,
}

impl DistanceHistogram {
    /// Stand-in for a histogram emptied by truncation; contributes zero weight.
    pub const SENTINEL: (u32, u32) = (1, 0);

    pub fn from_distances(distances: impl IntoIterator<Item = f64>) -> Self {
        let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
        for d in distances {
            *counts.entry(d.floor() as u32).or_insert(0) += 1;
        }
        Self {
            bins: counts.into_iter().collect(),
        }
    }

    /// Drop bins beyond `cutoff`; an emptied histogram becomes the sentinel bin.
    pub fn truncated(mut self, cutoff: f64) -> Self {
        self.bins.retain(|&(d, _)| d as f64 <= cutoff);
        if self.bins.is_empty() {
            self.bins.push(Self::SENTINEL);
        }
        self
    }

    pub fn bins(&self) -> &[(u32, u32)] {
        &self.bins
    }

    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|&(_, c)| c as u64).sum()
    }

    /// `sum(count * distance^-gamma)`.
    ///
    /// A zero-distance bin yields infinity for `gamma > 0`; unsettled cells never sit at
    /// distance zero from a member cell, but may from a cluster centroid.
    pub fn weight(&self, gamma: f64) -> f64 {
        self.bins
            .iter()
            .map(|&(d, c)| (d as f64).powf(-gamma) * c as f64)
            .sum()
    }
}

/// Per-unsettled-cell histograms for both classes.
///
/// Entry `i` of `rural` and `urban` belongs to `unsettled[i]`, which follows the
/// row-major order of [`classify_cells`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceField {
    pub rows: usize,
    pub cols: usize,
    pub mode: DistanceMode,
    pub truncation: Option<f64>,
    pub unsettled: Vec<Cell>,
    pub rural: Vec<DistanceHistogram>,
    pub urban: Vec<DistanceHistogram>,
}

impl DistanceField {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.unsettled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unsettled.is_empty()
    }
}

fn cell_points(cells: &[Cell]) -> Vec<[f64; 2]> {
    cells.iter().map(|&(r, c)| [r as f64, c as f64]).collect()
}

fn centroid_points(clusters: &[ClusterRecord]) -> Vec<[f64; 2]> {
    clusters.iter().map(|c| c.centroid).collect()
}

fn euclid(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// Histograms from every cell in `origins` to the class `members`.
fn class_histograms(
    origins: &[[f64; 2]],
    members: &[[f64; 2]],
    truncation: Option<f64>,
) -> Vec<DistanceHistogram> {
    match truncation {
        None => origins
            .par_iter()
            .map(|&o| DistanceHistogram::from_distances(members.iter().map(|&m| euclid(o, m))))
            .collect(),
        Some(cutoff) => {
            // floor(d) <= cutoff exactly when d < floor(cutoff) + 1.
            let radius = cutoff.floor() + 1.0;
            let tree = spatial::build_index(members);
            origins
                .par_iter()
                .map(|&o| {
                    let nearby = spatial::distances_within(&tree, o, radius);
                    DistanceHistogram::from_distances(nearby).truncated(cutoff)
                })
                .collect()
        }
    }
}

pub fn build_distance_field(
    grid: &Grid<bool>,
    threshold: f64,
    mode: DistanceMode,
    truncation: Option<f64>,
) -> DistanceField {
    let cells = classify_cells(grid, threshold);
    let (rural_points, urban_points) = match mode {
        DistanceMode::Full => (cell_points(&cells.rural), cell_points(&cells.urban)),
        DistanceMode::Centroid => {
            let clusters = classify_clusters(grid, threshold);
            (
                centroid_points(&clusters.rural),
                centroid_points(&clusters.urban),
            )
        }
    };
    let origins = cell_points(&cells.unsettled);

    DistanceField {
        rows: grid.rows(),
        cols: grid.cols(),
        mode,
        truncation,
        rural: class_histograms(&origins, &rural_points, truncation),
        urban: class_histograms(&origins, &urban_points, truncation),
        unsettled: cells.unsettled,
    }
}
