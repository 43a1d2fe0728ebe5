pub mod cluster;
pub mod config;
pub mod distance;
pub mod grid;
pub mod model;
pub mod probability;
pub mod spatial;
pub mod weights;

pub use cluster::{classify_cells, classify_clusters, settlement_type_matrix};
pub use config::{ModelParams, SimConfig, SimConfigError};
pub use distance::{build_distance_field, DistanceField, DistanceHistogram, DistanceMode};
pub use grid::{Cell, Grid, GridError};
pub use model::{ModelError, RunSummary, SettlementModel, Stage};
pub use probability::{predict_probabilities, ProbabilityGrid};
