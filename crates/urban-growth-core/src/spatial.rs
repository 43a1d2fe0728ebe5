use rstar::{RTree, AABB};

/// Build an R*-tree over settled points via bulk_load (O(n log n)).
pub fn build_index(points: &[[f64; 2]]) -> RTree<[f64; 2]> {
    RTree::bulk_load(points.to_vec())
}

/// Euclidean distances from `center` to every indexed point strictly closer than `radius`.
/// Uses AABB envelope query then filters by distance.
pub fn distances_within(tree: &RTree<[f64; 2]>, center: [f64; 2], radius: f64) -> Vec<f64> {
    let envelope = AABB::from_corners(
        [center[0] - radius, center[1] - radius],
        [center[0] + radius, center[1] + radius],
    );
    let r_sq = radius * radius;

    tree.locate_in_envelope(&envelope)
        .filter_map(|p| {
            let dx = p[0] - center[0];
            let dy = p[1] - center[1];
            let d_sq = dx * dx + dy * dy;
            (d_sq < r_sq).then(|| d_sq.sqrt())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_is_exclusive() {
        let tree = build_index(&[[0.0, 0.0], [0.0, 2.0], [3.0, 4.0], [1.0, 1.0]]);
        let mut found = distances_within(&tree, [0.0, 0.0], 2.0);
        found.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], 0.0);
        assert!((found[1] - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_index_yields_nothing() {
        let tree = build_index(&[]);
        assert!(distances_within(&tree, [1.0, 1.0], 10.0).is_empty());
    }
}
