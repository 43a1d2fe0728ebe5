use super::{ModelError, SettlementModel, Stage};
use crate::config::ModelParams;
use crate::grid::Grid;

/// Bernoulli log-likelihood of `observed` under `prob`.
///
/// Cells where `observed` is `NaN` are excluded. Terms that evaluate to `NaN`
/// (settled cells, or `0 * ln 0` at a certain outcome) are skipped; `-inf` terms are kept.
/// Returns the sum and the number of non-missing observations.
pub fn bernoulli_log_likelihood(observed: &Grid<f64>, prob: &Grid<f64>) -> (f64, usize) {
    let mut ll = 0.0;
    let mut n = 0usize;
    for (&x, &p) in observed.data().iter().zip(prob.data()) {
        if x.is_nan() {
            continue;
        }
        n += 1;
        let term = x * p.ln() + (1.0 - x) * (1.0 - p).ln();
        if !term.is_nan() {
            ll += term;
        }
    }
    (ll, n)
}

impl SettlementModel {
    /// Log-likelihood of an observed outcome grid given the initial grid and current config.
    ///
    /// `observed` holds 0/1 outcomes with `NaN` for excluded cells. With `normalized`, the
    /// sum is divided by the number of non-missing cells.
    pub fn log_likelihood(
        &mut self,
        observed: &Grid<f64>,
        normalized: bool,
    ) -> Result<f64, ModelError> {
        if observed.shape() != self.initial.shape() {
            return Err(ModelError::ShapeMismatch {
                what: "observed grid",
                expected: self.initial.shape(),
                actual: observed.shape(),
            });
        }
        let prob = self.probabilities(Stage::Initial).combined();
        let (ll, n) = bernoulli_log_likelihood(observed, &prob);
        Ok(if normalized { ll / n as f64 } else { ll })
    }

    /// [`log_likelihood`](Self::log_likelihood) under `params`, which replace the configured ones.
    pub fn log_likelihood_with(
        &mut self,
        observed: &Grid<f64>,
        params: ModelParams,
        normalized: bool,
    ) -> Result<f64, ModelError> {
        self.set_params(params)?;
        self.log_likelihood(observed, normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_observations_are_excluded() {
        let observed = Grid::from_vec(1, 3, vec![1.0, f64::NAN, 0.0]).unwrap();
        let prob = Grid::from_vec(1, 3, vec![0.5, 0.9, 0.25]).unwrap();
        let (ll, n) = bernoulli_log_likelihood(&observed, &prob);
        assert_eq!(n, 2);
        assert!((ll - (0.5f64.ln() + 0.75f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn settled_cells_contribute_nothing_but_still_count() {
        let observed = Grid::from_vec(1, 2, vec![1.0, 1.0]).unwrap();
        let prob = Grid::from_vec(1, 2, vec![f64::NAN, 0.5]).unwrap();
        let (ll, n) = bernoulli_log_likelihood(&observed, &prob);
        assert_eq!(n, 2);
        assert!((ll - 0.5f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn impossible_outcome_is_negative_infinity() {
        let observed = Grid::from_vec(1, 2, vec![1.0, 0.0]).unwrap();
        let prob = Grid::from_vec(1, 2, vec![0.0, 0.5]).unwrap();
        let (ll, _) = bernoulli_log_likelihood(&observed, &prob);
        assert_eq!(ll, f64::NEG_INFINITY);
    }
}
