//! Prediction orchestration
//!
//! Picks a forecasting strategy from the series length, blends the
//! applicable model outputs, derives a calibrated confidence, and converts
//! the blended SGPA into a credit-weighted CGPA forecast.

use super::forest::ForestRegressor;
use super::holt::HoltSmoother;
use super::polynomial::PolynomialRegressor;
use super::Regressor;
use crate::models::{PredictionBreakdown, PredictionMethod, PredictionResult, SemesterRecord};
use tracing::{debug, warn};

/// Lower clamp bound for reported SGPA/CGPA forecasts
pub const MIN_PREDICTED_GPA: f64 = 4.0;

/// Upper clamp bound for reported SGPA/CGPA forecasts
pub const MAX_PREDICTED_GPA: f64 = 10.0;

/// Series length at which the tree ensemble joins the blend
const FULL_ENSEMBLE_MIN_LEN: usize = 4;

/// Tunables for the prediction engine
///
/// The defaults carry the production policy; the struct exists so tests and
/// callers can pin a different seed or smoothing without forking the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Level smoothing factor for the EWMA model
    pub alpha: f64,
    /// Trend smoothing factor for the EWMA model
    pub beta: f64,
    /// Seed for the tree ensemble's bootstrap sampling
    pub seed: u64,
    /// Lower bound for reported forecasts
    pub min_gpa: f64,
    /// Upper bound for reported forecasts
    pub max_gpa: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha: super::holt::DEFAULT_ALPHA,
            beta: super::holt::DEFAULT_BETA,
            seed: 42,
            min_gpa: MIN_PREDICTED_GPA,
            max_gpa: MAX_PREDICTED_GPA,
        }
    }
}

/// Multi-model next-semester forecaster
///
/// Strategy by series length N:
/// - N = 0: all-zero result, zero confidence
/// - N = 1: the single SGPA, smoothing tag only
/// - N = 2-3: polynomial + smoothing blend
/// - N >= 4: tree ensemble + polynomial + smoothing blend
pub struct PredictionEngine {
    config: EngineConfig,
    holt: HoltSmoother,
    polynomial: PolynomialRegressor,
    forest: ForestRegressor,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            holt: HoltSmoother::new(config.alpha, config.beta),
            polynomial: PolynomialRegressor,
            forest: ForestRegressor::new(config.seed),
            config,
        }
    }

    /// Forecast the next semester from a (possibly unsorted) history.
    ///
    /// Never fails: degraded inputs produce degraded-confidence results, and
    /// re-running on identical input yields bit-identical output.
    pub fn predict(&self, history: &[SemesterRecord]) -> PredictionResult {
        if history.is_empty() {
            return PredictionResult {
                predicted_sgpa: 0.0,
                predicted_cgpa: 0.0,
                confidence: 0.0,
                method: PredictionMethod::Ewma,
                breakdown: PredictionBreakdown {
                    ewma: 0.0,
                    polynomial: None,
                    random_forest: None,
                },
            };
        }

        let mut sorted = history.to_vec();
        sorted.sort_by_key(|s| s.semester_number);
        let penalty = attendance_penalty(&sorted);

        if sorted.len() == 1 {
            let ewma = self.clamp(sorted[0].sgpa);
            return PredictionResult {
                predicted_sgpa: ewma,
                predicted_cgpa: self.predicted_cgpa(&sorted, ewma),
                confidence: (0.25 - penalty).max(0.10),
                method: PredictionMethod::Ewma,
                breakdown: PredictionBreakdown {
                    ewma,
                    polynomial: None,
                    random_forest: None,
                },
            };
        }

        let sgpa_series: Vec<f64> = sorted.iter().map(|s| s.sgpa).collect();
        let ewma = self.clamp(self.holt.forecast_series(&sgpa_series));

        let poly = match self.polynomial.forecast(&sorted) {
            Ok(forecast) => forecast,
            Err(err) => {
                // Unreachable for N >= 2, but a missing trend fit must not
                // take the whole prediction down with it.
                warn!(%err, "polynomial model unavailable, reporting smoothing only");
                return PredictionResult {
                    predicted_sgpa: ewma,
                    predicted_cgpa: self.predicted_cgpa(&sorted, ewma),
                    confidence: (0.25 - penalty).max(0.10),
                    method: PredictionMethod::Ewma,
                    breakdown: PredictionBreakdown {
                        ewma,
                        polynomial: None,
                        random_forest: None,
                    },
                };
            }
        };
        let poly_value = self.clamp(poly.value);

        if sorted.len() < FULL_ENSEMBLE_MIN_LEN {
            let blended = self.clamp(poly_value * 0.60 + ewma * 0.40);
            let confidence = round2((poly.fit_quality * 0.55 - penalty).clamp(0.25, 0.60));
            debug!(method = "polynomial", blended, confidence, "short-series blend");
            return PredictionResult {
                predicted_sgpa: blended,
                predicted_cgpa: self.predicted_cgpa(&sorted, blended),
                confidence,
                method: PredictionMethod::Polynomial,
                breakdown: PredictionBreakdown {
                    ewma,
                    polynomial: Some(poly_value),
                    random_forest: None,
                },
            };
        }

        match self.forest.forecast(&sorted) {
            Ok(tree) => {
                let tree_value = self.clamp(tree.value);
                // Strong disagreement between models erodes confidence
                let spread = (tree_value - poly_value).abs() + (poly_value - ewma).abs();
                let spread_penalty = (spread * 0.05).min(0.15);

                let blended = self.clamp(tree_value * 0.50 + poly_value * 0.30 + ewma * 0.20);
                let confidence = round2(
                    (tree.fit_quality * 0.55 + poly.fit_quality * 0.30 + 0.15
                        - penalty
                        - spread_penalty)
                        .clamp(0.40, 0.92),
                );
                debug!(
                    method = "random_forest_ensemble",
                    blended, confidence, spread, "full ensemble blend"
                );
                PredictionResult {
                    predicted_sgpa: blended,
                    predicted_cgpa: self.predicted_cgpa(&sorted, blended),
                    confidence,
                    method: PredictionMethod::RandomForestEnsemble,
                    breakdown: PredictionBreakdown {
                        ewma,
                        polynomial: Some(poly_value),
                        random_forest: Some(tree_value),
                    },
                }
            }
            Err(err) => {
                warn!(%err, "tree ensemble skipped, blending polynomial and smoothing");
                let blended = self.clamp(poly_value * 0.65 + ewma * 0.35);
                let confidence = round2((poly.fit_quality * 0.65 - penalty).clamp(0.35, 0.72));
                PredictionResult {
                    predicted_sgpa: blended,
                    predicted_cgpa: self.predicted_cgpa(&sorted, blended),
                    confidence,
                    method: PredictionMethod::Ensemble,
                    breakdown: PredictionBreakdown {
                        ewma,
                        polynomial: Some(poly_value),
                        random_forest: None,
                    },
                }
            }
        }
    }

    /// Clamp to the reporting range and round to 2 decimals
    fn clamp(&self, value: f64) -> f64 {
        round2(value.clamp(self.config.min_gpa, self.config.max_gpa))
    }

    /// Credit-weighted CGPA over the history extended by the forecast
    /// semester, which borrows the last known credit load as its weight.
    fn predicted_cgpa(&self, sorted: &[SemesterRecord], predicted_sgpa: f64) -> f64 {
        let last_credits = f64::from(sorted[sorted.len() - 1].total_credits);
        let mut weighted = predicted_sgpa * last_credits;
        let mut total = last_credits;
        for s in sorted {
            weighted += s.sgpa * f64::from(s.total_credits);
            total += f64::from(s.total_credits);
        }
        self.clamp(weighted / total.max(1.0))
    }
}

/// Confidence penalty from recent attendance (mean of the last 1-2 semesters)
fn attendance_penalty(sorted: &[SemesterRecord]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let start = sorted.len().saturating_sub(2);
    let recent = &sorted[start..];
    let avg = recent.iter().map(|s| s.overall_attendance).sum::<f64>() / recent.len() as f64;

    if avg < 65.0 {
        0.18
    } else if avg < 75.0 {
        0.10
    } else if avg < 85.0 {
        0.04
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semester(number: u32, sgpa: f64, attendance: f64) -> SemesterRecord {
        SemesterRecord {
            semester_number: number,
            sgpa,
            cgpa_after_semester: sgpa,
            total_credits: 20,
            earned_credits: 20,
            overall_attendance: attendance,
            backlogs: 0,
            subjects: Vec::new(),
        }
    }

    #[test]
    fn test_empty_history_zero_result() {
        let engine = PredictionEngine::new();
        let result = engine.predict(&[]);

        assert_eq!(result.predicted_sgpa, 0.0);
        assert_eq!(result.predicted_cgpa, 0.0);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.method, PredictionMethod::Ewma);
        assert_eq!(result.breakdown.ewma, 0.0);
        assert!(result.breakdown.polynomial.is_none());
    }

    #[test]
    fn test_single_semester_passthrough() {
        let engine = PredictionEngine::new();
        let result = engine.predict(&[semester(1, 7.5, 90.0)]);

        assert!((result.predicted_sgpa - 7.5).abs() < 1e-9);
        assert!((result.predicted_cgpa - 7.5).abs() < 1e-9);
        assert!((result.confidence - 0.25).abs() < 1e-9);
        assert_eq!(result.method, PredictionMethod::Ewma);
    }

    #[test]
    fn test_single_semester_attendance_floor() {
        let engine = PredictionEngine::new();
        // Penalty 0.18 would push 0.25 below the 0.10 floor
        let result = engine.predict(&[semester(1, 7.5, 60.0)]);
        assert!((result.confidence - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_low_sgpa_clamped_up() {
        let engine = PredictionEngine::new();
        let result = engine.predict(&[semester(1, 2.0, 90.0)]);
        assert!((result.predicted_sgpa - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_series_polynomial_blend() {
        let engine = PredictionEngine::new();
        let history = vec![
            semester(1, 6.0, 90.0),
            semester(2, 6.5, 88.0),
            semester(3, 7.0, 85.0),
        ];
        let result = engine.predict(&history);

        assert_eq!(result.method, PredictionMethod::Polynomial);
        // Linear trend: both models land on 7.5
        assert!((result.predicted_sgpa - 7.5).abs() < 1e-9);
        // Exact in-sample fit, no attendance penalty: 0.55 ceiling-free
        assert!((result.confidence - 0.55).abs() < 1e-9);
        assert!(result.breakdown.polynomial.is_some());
        assert!(result.breakdown.random_forest.is_none());
    }

    #[test]
    fn test_short_series_confidence_floor() {
        let engine = PredictionEngine::new();
        // Two points force the linear fallback (quality 0.4): 0.4 * 0.55 -
        // penalty sits below the 0.25 floor
        let history = vec![semester(1, 6.0, 70.0), semester(2, 6.5, 70.0)];
        let result = engine.predict(&history);

        assert_eq!(result.method, PredictionMethod::Polynomial);
        assert!((result.confidence - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_full_ensemble_method_and_bounds() {
        let engine = PredictionEngine::new();
        let history: Vec<_> = (1..=6)
            .map(|i| semester(i, 6.0 + 0.4 * f64::from(i - 1), 92.0))
            .collect();
        let result = engine.predict(&history);

        assert_eq!(result.method, PredictionMethod::RandomForestEnsemble);
        assert!(result.predicted_sgpa >= MIN_PREDICTED_GPA);
        assert!(result.predicted_sgpa <= MAX_PREDICTED_GPA);
        assert!((0.40..=0.92).contains(&result.confidence));
        assert!(result.breakdown.random_forest.is_some());
        // Upward trend keeps the blend near the top of the series
        assert!(result.predicted_sgpa >= 7.5, "sgpa {}", result.predicted_sgpa);
    }

    #[test]
    fn test_identical_input_identical_output() {
        let engine = PredictionEngine::new();
        let history: Vec<_> = (1..=7)
            .map(|i| semester(i, 6.0 + 0.3 * f64::from(i % 3), 88.0))
            .collect();

        let a = engine.predict(&history);
        let b = engine.predict(&history);
        assert_eq!(a.predicted_sgpa.to_bits(), b.predicted_sgpa.to_bits());
        assert_eq!(a.predicted_cgpa.to_bits(), b.predicted_cgpa.to_bits());
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
    }

    #[test]
    fn test_order_independence() {
        let engine = PredictionEngine::new();
        let ordered: Vec<_> = (1..=5)
            .map(|i| semester(i, 5.8 + 0.5 * f64::from(i - 1), 90.0))
            .collect();
        let mut shuffled = ordered.clone();
        shuffled.swap(0, 4);
        shuffled.swap(1, 3);

        let a = engine.predict(&ordered);
        let b = engine.predict(&shuffled);
        assert_eq!(a.predicted_sgpa.to_bits(), b.predicted_sgpa.to_bits());
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        assert_eq!(a.method, b.method);
    }

    #[test]
    fn test_attendance_penalty_reduces_confidence() {
        let engine = PredictionEngine::new();
        let strong: Vec<_> = (1..=3)
            .map(|i| semester(i, 6.0 + 0.5 * f64::from(i - 1), 95.0))
            .collect();
        let weak: Vec<_> = (1..=3)
            .map(|i| semester(i, 6.0 + 0.5 * f64::from(i - 1), 60.0))
            .collect();

        let high = engine.predict(&strong);
        let low = engine.predict(&weak);
        assert!(high.confidence > low.confidence);
    }

    #[test]
    fn test_predicted_cgpa_weighting() {
        let engine = PredictionEngine::new();
        let mut history = vec![semester(1, 6.0, 90.0), semester(2, 6.5, 90.0)];
        history[1].total_credits = 40;

        let result = engine.predict(&history);
        // Forecast semester is weighted by the last 40-credit load
        let expected =
            (6.0 * 20.0 + 6.5 * 40.0 + result.predicted_sgpa * 40.0) / (20.0 + 40.0 + 40.0);
        assert!((result.predicted_cgpa - round2(expected)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_credits_do_not_panic() {
        let engine = PredictionEngine::new();
        let mut record = semester(1, 7.5, 90.0);
        record.total_credits = 0;
        record.earned_credits = 0;

        let result = engine.predict(&[record]);
        assert!(result.predicted_cgpa.is_finite());
        assert!(result.predicted_cgpa >= MIN_PREDICTED_GPA);
    }

    #[test]
    fn test_attendance_penalty_table() {
        let series = |att: f64| vec![semester(1, 7.0, att), semester(2, 7.0, att)];
        assert_eq!(attendance_penalty(&series(95.0)), 0.0);
        assert_eq!(attendance_penalty(&series(80.0)), 0.04);
        assert_eq!(attendance_penalty(&series(70.0)), 0.10);
        assert_eq!(attendance_penalty(&series(50.0)), 0.18);
    }

    #[test]
    fn test_penalty_uses_recent_semesters_only() {
        // Early low attendance is forgiven once the recent two are strong
        let history = vec![
            semester(1, 7.0, 40.0),
            semester(2, 7.0, 90.0),
            semester(3, 7.0, 92.0),
        ];
        assert_eq!(attendance_penalty(&history), 0.0);
    }
}
