use crate::distance::DistanceField;
use crate::grid::Grid;

/// Power-law attraction weights toward each class. `NaN` outside unsettled cells.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightGrids {
    pub rural: Grid<f64>,
    pub urban: Grid<f64>,
}

/// Reduce each unsettled cell's histograms with `sum(count * d^-gamma)`.
pub fn distance_weights(field: &DistanceField, gamma_r: f64, gamma_u: f64) -> WeightGrids {
    let (rows, cols) = field.shape();
    let mut rural = Grid::filled(rows, cols, f64::NAN);
    let mut urban = Grid::filled(rows, cols, f64::NAN);
    for (i, &(r, c)) in field.unsettled.iter().enumerate() {
        rural.set(r, c, field.rural[i].weight(gamma_r));
        urban.set(r, c, field.urban[i].weight(gamma_u));
    }
    WeightGrids { rural, urban }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{build_distance_field, DistanceMode};

    fn grid(rows: &[&str]) -> Grid<bool> {
        Grid::from_rows(
            rows.iter()
                .map(|r| r.chars().map(|c| c == '#').collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn settled_cells_have_no_weight() {
        let g = grid(&["#..", "...", "..#"]);
        let field = build_distance_field(&g, 1.0, DistanceMode::Full, None);
        let w = distance_weights(&field, 1.0, 1.0);
        assert!(w.urban.get(0, 0).is_nan());
        assert!(w.rural.get(2, 2).is_nan());
        assert!(!w.urban.get(1, 1).is_nan());
    }

    #[test]
    fn weight_sums_decayed_counts() {
        // Urban cells at (0,0) and (0,2); from (2,0): distances 2 and floor(2.83) = 2.
        let g = grid(&["#.#", "...", "..."]);
        let field = build_distance_field(&g, 1.0, DistanceMode::Full, None);
        let w = distance_weights(&field, 1.0, 2.0);
        assert!((w.urban.get(2, 0) - 2.0 / 4.0).abs() < 1e-12);
        assert_eq!(*w.rural.get(2, 0), 0.0);
    }

    #[test]
    fn zero_gamma_counts_members() {
        let g = grid(&["##.", "...", "#.."]);
        let field = build_distance_field(&g, 2.0, DistanceMode::Full, None);
        let w = distance_weights(&field, 0.0, 0.0);
        assert_eq!(*w.urban.get(1, 1), 2.0);
        assert_eq!(*w.rural.get(1, 1), 1.0);
    }

    #[test]
    fn weights_are_independent_of_label_order() {
        // Mirroring the grid reverses discovery order of the clusters.
        let rows = ["#....##", ".......", "..#....", "......#", "##....."];
        let mirrored: Vec<String> = rows.iter().map(|r| r.chars().rev().collect()).collect();
        let mirrored: Vec<&str> = mirrored.iter().map(String::as_str).collect();
        let a = grid(&rows);
        let b = grid(&mirrored);
        for mode in [DistanceMode::Full, DistanceMode::Centroid] {
            let wa = distance_weights(&build_distance_field(&a, 2.0, mode, None), 1.5, 0.5);
            let wb = distance_weights(&build_distance_field(&b, 2.0, mode, None), 1.5, 0.5);
            let cols = a.cols();
            for ((r, c), &v) in wa.urban.iter_cells() {
                let m = *wb.urban.get(r, cols - 1 - c);
                assert!((v.is_nan() && m.is_nan()) || (v - m).abs() < 1e-12);
            }
            for ((r, c), &v) in wa.rural.iter_cells() {
                let m = *wb.rural.get(r, cols - 1 - c);
                assert!((v.is_nan() && m.is_nan()) || (v - m).abs() < 1e-12);
            }
        }
    }
}
