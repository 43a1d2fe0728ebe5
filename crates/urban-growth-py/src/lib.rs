use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use urban_growth_core::{Grid, SettlementModel, SimConfig, Stage};

fn value_err(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn occupancy(rows: Vec<Vec<u8>>) -> PyResult<Grid<bool>> {
    Grid::from_rows(rows)
        .map(|g| g.map(|&v| v != 0))
        .map_err(value_err)
}

fn build_model(
    initial: Vec<Vec<u8>>,
    prior: Option<Vec<Vec<f64>>>,
    config_json: Option<&str>,
) -> PyResult<SettlementModel> {
    let config = match config_json {
        Some(json) => SimConfig::from_json(json).map_err(value_err)?,
        None => SimConfig::default(),
    };
    let prior = prior
        .map(Grid::from_rows)
        .transpose()
        .map_err(value_err)?;
    SettlementModel::new(occupancy(initial)?, prior, config).map_err(value_err)
}

#[pyfunction]
fn version() -> &'static str {
    "0.1.0"
}

/// Settlement type matrix: 1 urban, -1 rural, 0 unsettled.
#[pyfunction]
#[pyo3(signature = (grid, threshold))]
fn settlement_types(grid: Vec<Vec<u8>>, threshold: f64) -> PyResult<Vec<Vec<i8>>> {
    Ok(urban_growth_core::settlement_type_matrix(&occupancy(grid)?, threshold).to_rows())
}

/// Rural and urban growth probabilities on the initial grid.
#[pyfunction]
#[pyo3(signature = (initial, config_json=None, prior=None))]
fn density(
    initial: Vec<Vec<u8>>,
    config_json: Option<&str>,
    prior: Option<Vec<Vec<f64>>>,
) -> PyResult<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
    let mut model = build_model(initial, prior, config_json)?;
    let probs = model.probabilities(Stage::Initial);
    Ok((probs.rural.to_rows(), probs.urban.to_rows()))
}

/// Forward simulation; returns the settlement-time grid (`nan` where nothing settled).
#[pyfunction]
#[pyo3(signature = (initial, n_iters, config_json=None, prior=None))]
fn dynamics(
    initial: Vec<Vec<u8>>,
    n_iters: usize,
    config_json: Option<&str>,
    prior: Option<Vec<Vec<f64>>>,
) -> PyResult<Vec<Vec<f64>>> {
    let mut model = build_model(initial, prior, config_json)?;
    let summary = model.run_dynamics(n_iters).map_err(value_err)?;
    Ok(summary.settlement_times.to_rows())
}

#[pyfunction]
#[pyo3(signature = (initial, observed, config_json=None, prior=None, normalized=false))]
fn log_likelihood(
    initial: Vec<Vec<u8>>,
    observed: Vec<Vec<f64>>,
    config_json: Option<&str>,
    prior: Option<Vec<Vec<f64>>>,
    normalized: bool,
) -> PyResult<f64> {
    let mut model = build_model(initial, prior, config_json)?;
    let observed = Grid::from_rows(observed).map_err(value_err)?;
    model
        .log_likelihood(&observed, normalized)
        .map_err(value_err)
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(settlement_types, m)?)?;
    m.add_function(wrap_pyfunction!(density, m)?)?;
    m.add_function(wrap_pyfunction!(dynamics, m)?)?;
    m.add_function(wrap_pyfunction!(log_likelihood, m)?)?;
    Ok(())
}
