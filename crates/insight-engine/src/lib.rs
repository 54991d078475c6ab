//! Academic performance insight engine
//!
//! This crate provides the core functionality for:
//! - Multi-model next-semester SGPA/CGPA forecasting (Holt smoothing,
//!   polynomial trend, bagged regression trees)
//! - Strategy selection by history length with calibrated confidence
//! - Consistency scoring over a semester series
//! - Rule-based strengths, warnings, and subject recommendations
//!
//! The engine is purely computational: it consumes an ordered (or unordered,
//! it re-sorts) list of semester records and returns freshly built results.
//! Persistence, rendering, and data entry belong to collaborating layers.

pub mod grades;
pub mod insights;
pub mod models;
pub mod predictor;

pub use insights::{generate_insights, recommended_subjects, strengths, warnings, ConsistencyScorer};
pub use models::*;
pub use predictor::{
    EngineConfig, FitError, ModelForecast, PredictionEngine, Regressor, MAX_PREDICTED_GPA,
    MIN_PREDICTED_GPA,
};
