//! Holt's linear-trend exponential smoothing
//!
//! Double exponential smoothing with a level and a trend component. Only the
//! one-step-ahead forecast is exposed, not the smoothed history.

use super::{FitError, ModelForecast, Regressor};
use crate::models::SemesterRecord;

/// Default level smoothing factor (weight on the newest observation)
pub const DEFAULT_ALPHA: f64 = 0.65;

/// Default trend smoothing factor
pub const DEFAULT_BETA: f64 = 0.30;

/// One-step-ahead forecaster using Holt's double exponential smoothing
#[derive(Debug, Clone)]
pub struct HoltSmoother {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for HoltSmoother {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }
}

impl HoltSmoother {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Smooth a raw series and forecast one step ahead.
    ///
    /// A single observation is returned as-is; an empty series forecasts 0.
    pub fn forecast_series(&self, values: &[f64]) -> f64 {
        match values {
            [] => 0.0,
            [only] => *only,
            _ => {
                let mut level = values[0];
                let mut trend = values[1] - values[0];

                for &y in &values[1..] {
                    let prev_level = level;
                    level = self.alpha * y + (1.0 - self.alpha) * (prev_level + trend);
                    trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
                }

                level + trend
            }
        }
    }
}

impl Regressor for HoltSmoother {
    fn name(&self) -> &'static str {
        "ewma"
    }

    fn forecast(&self, history: &[SemesterRecord]) -> Result<ModelForecast, FitError> {
        if history.is_empty() {
            return Err(FitError::InsufficientData { need: 1, have: 0 });
        }
        let series: Vec<f64> = history.iter().map(|s| s.sgpa).collect();
        Ok(ModelForecast {
            value: self.forecast_series(&series),
            fit_quality: 0.0,
        })
    }
}
