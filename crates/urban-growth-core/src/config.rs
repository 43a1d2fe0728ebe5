use crate::distance::DistanceMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decay exponents and logistic coefficients of the growth model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub gamma_r: f64,
    pub gamma_u: f64,
    pub alpha_r: f64,
    pub beta_r: f64,
    pub alpha_u: f64,
    pub beta_u: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            gamma_r: 1.0,
            gamma_u: 1.0,
            alpha_r: 1.0,
            beta_r: 0.0,
            alpha_u: 1.0,
            beta_u: 0.0,
        }
    }
}

impl ModelParams {
    pub fn validate(&self) -> Result<(), SimConfigError> {
        for (name, gamma) in [("gamma_r", self.gamma_r), ("gamma_u", self.gamma_u)] {
            if !gamma.is_finite() || gamma < 0.0 {
                return Err(SimConfigError::InvalidGamma { name, value: gamma });
            }
        }
        for (name, value) in [
            ("alpha_r", self.alpha_r),
            ("beta_r", self.beta_r),
            ("alpha_u", self.alpha_u),
            ("beta_u", self.beta_u),
        ] {
            if !value.is_finite() {
                return Err(SimConfigError::NonFiniteParameter { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Minimum cluster area counted as urban.
    pub threshold: f64,
    pub mode: DistanceMode,
    /// Drop distances whose integer part exceeds this cutoff.
    pub truncation: Option<f64>,
    /// Multiply predicted probabilities by the geographic prior.
    pub use_geo: bool,
    pub seed: u64,
    pub params: ModelParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            mode: DistanceMode::Full,
            truncation: None,
            use_geo: false,
            seed: 42,
            params: ModelParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimConfigError {
    #[error("threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
    #[error("truncation must be finite and non-negative, got {0}")]
    InvalidTruncation(f64),
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidGamma { name: &'static str, value: f64 },
    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },
    #[error("failed to parse config: {0}")]
    Parse(String),
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimConfigError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(SimConfigError::InvalidThreshold(self.threshold));
        }
        if let Some(t) = self.truncation {
            if !t.is_finite() || t < 0.0 {
                return Err(SimConfigError::InvalidTruncation(t));
            }
        }
        self.params.validate()
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SimConfigError> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| SimConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
