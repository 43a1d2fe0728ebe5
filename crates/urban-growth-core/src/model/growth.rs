use super::metrics::{RunSummary, StepRecord};
use super::{ModelError, SettlementModel, Stage};
use crate::grid::Grid;
use rand::Rng;

/// First step index of a dynamics run; times are reported shifted down by one.
pub const FIRST_STEP_INDEX: u32 = 2;

/// Occupancy plus the running `step * newly_settled` accumulator.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowthState {
    pub grid: Grid<bool>,
    pub settled_at: Grid<u32>,
}

impl GrowthState {
    /// Fresh accumulator over an independent copy of `grid`.
    pub fn new(grid: &Grid<bool>) -> Self {
        Self {
            grid: grid.clone(),
            settled_at: Grid::filled(grid.rows(), grid.cols(), 0),
        }
    }

    /// Step indices as zero-based times; cells that never settled during the run are `NaN`.
    pub fn settlement_times(&self) -> Grid<f64> {
        self.settled_at.map(|&t| match t {
            0 => f64::NAN,
            t => t as f64 - 1.0,
        })
    }
}

/// Draw which unsettled cells settle this step: one uniform draw per unsettled
/// cell, settling when it falls below the combined probability.
pub fn sample_new_settlements<R: Rng + ?Sized>(
    grid: &Grid<bool>,
    combined: &Grid<f64>,
    rng: &mut R,
) -> Grid<bool> {
    grid.zip_map(combined, |&occupied, &p| {
        // NaN probabilities never compare below a draw.
        !occupied && rng.random::<f64>() < p
    })
}

/// One growth transition. Returns the next state and the number of newly settled cells.
pub fn transition<R: Rng + ?Sized>(
    state: &GrowthState,
    combined: &Grid<f64>,
    step: u32,
    rng: &mut R,
) -> (GrowthState, usize) {
    let new = sample_new_settlements(&state.grid, combined, rng);
    let newly_settled = new.occupied_count();
    let next = GrowthState {
        grid: state.grid.zip_map(&new, |&a, &b| a || b),
        settled_at: state
            .settled_at
            .zip_map(&new, |&t, &b| if b { t + step } else { t }),
    };
    (next, newly_settled)
}

impl SettlementModel {
    pub const MAX_DYNAMICS_STEPS: usize = 1_000_000;

    /// Sample one step of new settlements from the current grid without applying it.
    pub fn sample(&mut self) -> Grid<bool> {
        let combined = self.probabilities(Stage::Current).combined();
        sample_new_settlements(&self.current, &combined, &mut self.rng)
    }

    /// Sample and apply one growth step to the current grid. Returns the new cells.
    pub fn step_growth(&mut self) -> Grid<bool> {
        let new = self.sample();
        self.current = self.current.zip_map(&new, |&a, &b| a || b);
        tracing::debug!(newly_settled = new.occupied_count(), "growth step");
        new
    }

    /// Run `n_iters` growth steps on the current grid and record when each cell settled.
    pub fn run_dynamics(&mut self, n_iters: usize) -> Result<RunSummary, ModelError> {
        if n_iters > Self::MAX_DYNAMICS_STEPS {
            return Err(ModelError::TooManySteps {
                max: Self::MAX_DYNAMICS_STEPS,
                actual: n_iters,
            });
        }

        let mut state = GrowthState::new(&self.current);
        let mut records = Vec::with_capacity(n_iters);
        for offset in 0..n_iters as u32 {
            let step = FIRST_STEP_INDEX + offset;
            let combined = self.probabilities(Stage::Current).combined();
            let (next, newly_settled) = transition(&state, &combined, step, &mut self.rng);
            state = next;
            self.current = state.grid.clone();
            tracing::debug!(step, newly_settled, "growth step");
            records.push(StepRecord {
                step: step as usize,
                newly_settled,
                occupied: self.current.occupied_count(),
            });
        }

        let final_occupied = self.current.occupied_count();
        tracing::info!(steps = n_iters, final_occupied, "dynamics run finished");
        Ok(RunSummary {
            schema_version: 1,
            steps: n_iters,
            records,
            final_occupied,
            settlement_times: state.settlement_times(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn transition_records_step_of_first_settlement() {
        let grid = Grid::from_rows(vec![vec![true, false, false]]).unwrap();
        let state = GrowthState::new(&grid);
        let certain = Grid::from_vec(1, 3, vec![f64::NAN, 1.0, 0.0]).unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(7);

        let (next, n) = transition(&state, &certain, 2, &mut rng);
        assert_eq!(n, 1);
        assert_eq!(next.grid.data(), &[true, true, false]);
        assert_eq!(next.settled_at.data(), &[0, 2, 0]);
        // Input state is untouched.
        assert_eq!(state.grid.data(), &[true, false, false]);

        let (last, n) = transition(&next, &certain, 3, &mut rng);
        assert_eq!(n, 0);
        assert_eq!(last.settled_at.data(), &[0, 2, 0]);

        let times = last.settlement_times();
        assert!(times.data()[0].is_nan());
        assert_eq!(times.data()[1], 1.0);
        assert!(times.data()[2].is_nan());
    }

    #[test]
    fn occupied_cells_ignore_probability() {
        let grid = Grid::from_rows(vec![vec![true, true]]).unwrap();
        let always = Grid::filled(1, 2, 1.0);
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let new = sample_new_settlements(&grid, &always, &mut rng);
        assert_eq!(new.occupied_count(), 0);
    }

    #[test]
    fn sampling_is_deterministic_for_fixed_seed() {
        let grid = Grid::filled(6, 6, false);
        let half = Grid::filled(6, 6, 0.5);
        let a = sample_new_settlements(&grid, &half, &mut ChaCha12Rng::seed_from_u64(11));
        let b = sample_new_settlements(&grid, &half, &mut ChaCha12Rng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
