pub mod growth;
pub mod likelihood;
pub mod metrics;

pub use metrics::*;

use crate::cluster;
use crate::config::{ModelParams, SimConfig, SimConfigError};
use crate::distance::{build_distance_field, DistanceField, DistanceMode};
use crate::grid::Grid;
use crate::probability::{probabilities_unchecked, ProbabilityGrid};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which grid a computation reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The grid supplied at construction. Fixed covariate for calibration.
    Initial,
    /// The grid mutated by growth steps.
    Current,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("{what} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("geographic prior must be finite and non-negative, found {value} at {cell:?}")]
    InvalidPrior { cell: (usize, usize), value: f64 },
    #[error(transparent)]
    Config(#[from] SimConfigError),
    #[error("n_iters ({actual}) exceeds supported maximum ({max})")]
    TooManySteps { max: usize, actual: usize },
}

/// Everything the distance field depends on besides the grid contents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DistanceKey {
    pub stage: Stage,
    pub mode: DistanceMode,
    pub truncation: Option<f64>,
    pub threshold: f64,
}

/// Cached field together with the key it was computed under; replaced as a whole.
#[derive(Clone, Debug)]
pub(crate) struct CachedDistances {
    pub key: DistanceKey,
    pub field: DistanceField,
}

impl CachedDistances {
    /// The current grid may have changed since the last call, so it is never reused.
    pub fn serves(&self, key: &DistanceKey) -> bool {
        key.stage == Stage::Initial && self.key == *key
    }
}

/// Return a distance field valid for `key`, recomputing from `grid` when the cache can't serve it.
pub(crate) fn refresh_distances<'a>(
    cache: &'a mut Option<CachedDistances>,
    grid: &Grid<bool>,
    key: DistanceKey,
) -> &'a DistanceField {
    if cache.as_ref().is_some_and(|c| !c.serves(&key)) {
        *cache = None;
    }
    if cache.is_some() {
        tracing::trace!(stage = ?key.stage, "reusing cached distance field");
    }
    let cached = cache.get_or_insert_with(|| {
        let field = build_distance_field(grid, key.threshold, key.mode, key.truncation);
        tracing::debug!(
            stage = ?key.stage,
            mode = ?key.mode,
            truncation = ?key.truncation,
            unsettled = field.len(),
            "recalculated distance field"
        );
        CachedDistances { key, field }
    });
    &cached.field
}

/// Settlement growth model: owns the initial and current grids, the geographic
/// prior, the distance cache and the random generator used by growth steps.
pub struct SettlementModel {
    pub(crate) initial: Grid<bool>,
    pub(crate) current: Grid<bool>,
    pub(crate) prior: Grid<f64>,
    /// The prior was defaulted to ones rather than supplied.
    pub(crate) prior_is_default: bool,
    pub(crate) config: SimConfig,
    pub(crate) cache: Option<CachedDistances>,
    pub(crate) rng: ChaCha12Rng,
}

impl SettlementModel {
    pub fn new(
        initial: Grid<bool>,
        prior: Option<Grid<f64>>,
        config: SimConfig,
    ) -> Result<Self, ModelError> {
        config.validate()?;
        let prior_is_default = prior.is_none();
        let prior = match prior {
            Some(prior) => {
                check_prior(&prior, initial.shape())?;
                prior
            }
            None => Grid::filled(initial.rows(), initial.cols(), 1.0),
        };
        Ok(Self {
            current: initial.clone(),
            initial,
            prior,
            prior_is_default,
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            config,
            cache: None,
        })
    }

    pub fn initial(&self) -> &Grid<bool> {
        &self.initial
    }

    pub fn current(&self) -> &Grid<bool> {
        &self.current
    }

    pub fn prior(&self) -> &Grid<f64> {
        &self.prior
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    fn grid(&self, stage: Stage) -> &Grid<bool> {
        match stage {
            Stage::Initial => &self.initial,
            Stage::Current => &self.current,
        }
    }

    /// Replace the initial grid and restart the current grid from a copy of it.
    pub fn set_initial(&mut self, initial: Grid<bool>) -> Result<(), ModelError> {
        if initial.shape() != self.prior.shape() {
            if !self.prior_is_default {
                return Err(ModelError::ShapeMismatch {
                    what: "initial grid",
                    expected: self.prior.shape(),
                    actual: initial.shape(),
                });
            }
            self.prior = Grid::filled(initial.rows(), initial.cols(), 1.0);
        }
        self.current = initial.clone();
        self.initial = initial;
        self.cache = None;
        Ok(())
    }

    pub fn set_prior(&mut self, prior: Grid<f64>) -> Result<(), ModelError> {
        check_prior(&prior, self.initial.shape())?;
        self.prior = prior;
        self.prior_is_default = false;
        Ok(())
    }

    pub fn set_config(&mut self, config: SimConfig) -> Result<(), ModelError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Swap only the growth parameters; distance fields do not depend on them.
    pub fn set_params(&mut self, params: ModelParams) -> Result<(), ModelError> {
        params.validate()?;
        self.config.params = params;
        Ok(())
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha12Rng::seed_from_u64(seed);
    }

    pub fn settlement_type_matrix(&self, stage: Stage) -> Grid<i8> {
        cluster::settlement_type_matrix(self.grid(stage), self.config.threshold)
    }

    fn distance_key(&self, stage: Stage) -> DistanceKey {
        DistanceKey {
            stage,
            mode: self.config.mode,
            truncation: self.config.truncation,
            threshold: self.config.threshold,
        }
    }

    fn field_and_prior(&mut self, stage: Stage) -> (&DistanceField, &Grid<f64>) {
        let key = self.distance_key(stage);
        let grid = match stage {
            Stage::Initial => &self.initial,
            Stage::Current => &self.current,
        };
        (refresh_distances(&mut self.cache, grid, key), &self.prior)
    }

    /// Distance field for `stage`, served from cache when it is still valid.
    pub fn distances(&mut self, stage: Stage) -> &DistanceField {
        self.field_and_prior(stage).0
    }

    /// Rural and urban growth probabilities for `stage`.
    pub fn probabilities(&mut self, stage: Stage) -> ProbabilityGrid {
        let params = self.config.params;
        let use_geo = self.config.use_geo;
        let (field, prior) = self.field_and_prior(stage);
        // The prior's shape is checked on every path that sets it.
        probabilities_unchecked(field, &params, use_geo.then_some(prior))
    }
}

fn check_prior(prior: &Grid<f64>, shape: (usize, usize)) -> Result<(), ModelError> {
    if prior.shape() != shape {
        return Err(ModelError::ShapeMismatch {
            what: "geographic prior",
            expected: shape,
            actual: prior.shape(),
        });
    }
    if let Some((cell, &value)) = prior
        .iter_cells()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(ModelError::InvalidPrior { cell, value });
    }
    Ok(())
}
