use crate::grid::Grid;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StepRecord {
    /// Step index as used in the settlement-time accumulator.
    pub step: usize,
    pub newly_settled: usize,
    pub occupied: usize,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    #[serde(default)]
    pub records: Vec<StepRecord>,
    pub final_occupied: usize,
    /// Zero-based step at which each cell settled during the run; `NaN` if it never did.
    /// Serialized with `null` in place of `NaN`.
    #[serde(with = "nan_as_null")]
    pub settlement_times: Grid<f64>,
}

impl RunSummary {
    pub fn total_new_settlements(&self) -> usize {
        self.records.iter().map(|r| r.newly_settled).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

mod nan_as_null {
    use crate::grid::Grid;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(grid: &Grid<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        grid.map(|&v| (!v.is_nan()).then_some(v))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Grid<f64>, D::Error> {
        let grid = Grid::<Option<f64>>::deserialize(deserializer)?;
        Ok(grid.map(|v| v.unwrap_or(f64::NAN)))
    }
}
