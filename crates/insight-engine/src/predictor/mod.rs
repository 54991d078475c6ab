//! Multi-model SGPA forecasting

mod engine;
mod features;
mod forest;
mod holt;
mod polynomial;

pub use engine::{EngineConfig, PredictionEngine, MAX_PREDICTED_GPA, MIN_PREDICTED_GPA};
pub use features::{
    build_features, linear_fit, linear_regression_slope, mean, std_dev, variance, FeatureVector,
    NUM_FEATURES,
};
pub use forest::{ForestRegressor, MIN_SERIES_LEN};
pub use holt::HoltSmoother;
pub use polynomial::PolynomialRegressor;

use crate::models::SemesterRecord;
use thiserror::Error;

/// Why a regressor could not produce a forecast
///
/// These never cross the public prediction boundary: the orchestrator drops
/// the failed model from the blend and degrades confidence instead.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("need at least {need} semesters, have {have}")]
    InsufficientData { need: usize, have: usize },
    #[error("singular system in least-squares fit")]
    SingularSystem,
}

/// A one-step-ahead forecast from a single model
#[derive(Debug, Clone, Copy)]
pub struct ModelForecast {
    /// Raw (unclamped) forecast value
    pub value: f64,
    /// In-sample fit quality in [0, 1], used for confidence weighting.
    /// Models without a quality estimate report 0.
    pub fit_quality: f64,
}

/// Trait for single-model trend forecasters
///
/// Implementations fit on a semester history ordered ascending by
/// `semester_number` ([`PredictionEngine`] normalizes ordering before
/// delegating) and forecast the next semester's SGPA.
pub trait Regressor {
    /// Short tag used in logs
    fn name(&self) -> &'static str;

    /// Fit on `history` and forecast one step ahead
    fn forecast(&self, history: &[SemesterRecord]) -> Result<ModelForecast, FitError>;
}
