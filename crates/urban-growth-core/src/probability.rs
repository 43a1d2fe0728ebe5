//! Paired logistic transform from attraction weights to growth probabilities.

use crate::config::ModelParams;
use crate::distance::DistanceField;
use crate::grid::Grid;
use crate::model::ModelError;
use crate::weights::{distance_weights, WeightGrids};

/// Per-cell probability of becoming rural or urban. `NaN` on already settled cells.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityGrid {
    pub rural: Grid<f64>,
    pub urban: Grid<f64>,
}

impl ProbabilityGrid {
    /// Probability of any new settlement, `rural + urban`.
    pub fn combined(&self) -> Grid<f64> {
        self.rural.zip_map(&self.urban, |r, u| r + u)
    }

    /// Scale both grids cell by cell.
    pub fn scaled_by(&self, prior: &Grid<f64>) -> Self {
        Self {
            rural: self.rural.zip_map(prior, |p, g| p * g),
            urban: self.urban.zip_map(prior, |p, g| p * g),
        }
    }
}

#[inline]
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// `p_r^2 / (p_r + p_u)` and `p_u^2 / (p_r + p_u)`. A zero denominator propagates `NaN`.
#[inline]
pub fn growth_shares(w_rural: f64, w_urban: f64, params: &ModelParams) -> (f64, f64) {
    let p_r = logistic(params.alpha_r * w_rural + params.beta_r);
    let p_u = logistic(params.alpha_u * w_urban + params.beta_u);
    let denom = p_r + p_u;
    (p_r * p_r / denom, p_u * p_u / denom)
}

pub fn model_probabilities(weights: &WeightGrids, params: &ModelParams) -> ProbabilityGrid {
    let shares = weights
        .rural
        .zip_map(&weights.urban, |&r, &u| growth_shares(r, u, params));
    ProbabilityGrid {
        rural: shares.map(|s| s.0),
        urban: shares.map(|s| s.1),
    }
}

/// Distance field to probabilities, optionally scaled by a geographic prior of the same shape.
pub fn predict_probabilities(
    field: &DistanceField,
    params: &ModelParams,
    prior: Option<&Grid<f64>>,
) -> Result<ProbabilityGrid, ModelError> {
    if let Some(prior) = prior {
        if prior.shape() != field.shape() {
            return Err(ModelError::ShapeMismatch {
                what: "geographic prior",
                expected: field.shape(),
                actual: prior.shape(),
            });
        }
    }
    Ok(probabilities_unchecked(field, params, prior))
}

/// [`predict_probabilities`] for a prior already known to match the field's shape.
pub(crate) fn probabilities_unchecked(
    field: &DistanceField,
    params: &ModelParams,
    prior: Option<&Grid<f64>>,
) -> ProbabilityGrid {
    let weights = distance_weights(field, params.gamma_r, params.gamma_u);
    let probs = model_probabilities(&weights, params);
    match prior {
        Some(prior) => probs.scaled_by(prior),
        None => probs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{build_distance_field, DistanceMode};

    fn params(alpha: f64, beta: f64) -> ModelParams {
        ModelParams {
            gamma_r: 1.0,
            gamma_u: 1.0,
            alpha_r: alpha,
            beta_r: beta,
            alpha_u: alpha,
            beta_u: beta,
        }
    }

    #[test]
    fn logistic_midpoint_and_tails() {
        assert_eq!(logistic(0.0), 0.5);
        assert!(logistic(40.0) > 0.999_999);
        assert!(logistic(-40.0) < 1e-12);
    }

    #[test]
    fn equal_class_probabilities_split_evenly() {
        let (r, u) = growth_shares(0.3, 0.3, &params(2.0, -1.0));
        assert!((r - u).abs() < 1e-15);
        // p^2 / 2p = p / 2 for each class.
        let p = logistic(2.0 * 0.3 - 1.0);
        assert!((r - p / 2.0).abs() < 1e-15);
    }

    #[test]
    fn vanishing_probabilities_are_undefined() {
        let (r, u) = growth_shares(0.0, 0.0, &params(1.0, -1.0e6));
        assert!(r.is_nan());
        assert!(u.is_nan());
    }

    #[test]
    fn stronger_class_wins_quadratically() {
        let p = ModelParams {
            gamma_r: 1.0,
            gamma_u: 1.0,
            alpha_r: 0.0,
            beta_r: 0.0,
            alpha_u: 0.0,
            beta_u: 3.0_f64.ln(),
        };
        // p_r = 1/2, p_u = 3/4
        let (r, u) = growth_shares(0.0, 0.0, &p);
        assert!((r - 0.25 / 1.25).abs() < 1e-12);
        assert!((u - 0.5625 / 1.25).abs() < 1e-12);
        assert!(r + u <= 0.5 + 0.75);
    }

    #[test]
    fn prior_must_match_field_shape() {
        let g = Grid::from_rows(vec![vec![false; 3], vec![false, true, false], vec![false; 3]])
            .unwrap();
        let field = build_distance_field(&g, 1.0, DistanceMode::Full, None);
        let p = params(1.0, 0.0);

        let err = predict_probabilities(&field, &p, Some(&Grid::filled(2, 2, 1.0))).unwrap_err();
        assert_eq!(
            err,
            ModelError::ShapeMismatch {
                what: "geographic prior",
                expected: (3, 3),
                actual: (2, 2),
            }
        );

        let mut prior = Grid::filled(3, 3, 1.0);
        prior.set(0, 0, 0.5);
        let scaled = predict_probabilities(&field, &p, Some(&prior)).unwrap();
        let plain = predict_probabilities(&field, &p, None).unwrap();
        assert!((scaled.urban.get(0, 0) - plain.urban.get(0, 0) * 0.5).abs() < 1e-15);
        assert_eq!(scaled.urban.get(2, 2), plain.urban.get(2, 2));
    }

    #[test]
    fn nan_weights_stay_nan() {
        let (r, u) = growth_shares(f64::NAN, f64::NAN, &params(1.0, 0.0));
        assert!(r.is_nan() && u.is_nan());
    }
}
