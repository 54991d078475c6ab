//! Core data models for the insight engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single subject taken in a semester
///
/// Consumed only by the insight rule generators; the trend regressors work
/// from the semester-level aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub name: String,
    pub credits: u32,
    pub grade: String,
    pub grade_point: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_percentage: Option<f64>,
}

/// One completed semester of a student's record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterRecord {
    /// Positive, unique within a student's series; defines chronological order
    pub semester_number: u32,
    /// Semester grade point average in [0, 10]
    pub sgpa: f64,
    /// Cumulative GPA through this semester, in [0, 10]
    pub cgpa_after_semester: f64,
    pub total_credits: u32,
    pub earned_credits: u32,
    /// Overall attendance percentage in [0, 100]
    pub overall_attendance: f64,
    /// Failed or unresolved subjects carried out of this semester
    pub backlogs: u32,
    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,
}

/// Strategy that produced the final blended forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    Ewma,
    Polynomial,
    Ensemble,
    RandomForestEnsemble,
}

/// Per-model predictions (clamped) that fed the final blend
///
/// The smoothing forecast is always present; the other entries appear only
/// when the corresponding model ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionBreakdown {
    pub ewma: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polynomial: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_forest: Option<f64>,
}

/// Next-semester forecast produced by the prediction engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Forecast SGPA, clamped to [4.0, 10.0] (zero for an empty history)
    pub predicted_sgpa: f64,
    /// Credit-weighted CGPA after the forecast semester, same clamp
    pub predicted_cgpa: f64,
    /// Calibrated confidence in [0, 1]
    pub confidence: f64,
    pub method: PredictionMethod,
    pub breakdown: PredictionBreakdown,
}

/// Qualitative band for a consistency score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyLabel {
    Excellent,
    Good,
    Average,
    Inconsistent,
}

impl fmt::Display for ConsistencyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsistencyLabel::Excellent => "Excellent",
            ConsistencyLabel::Good => "Good",
            ConsistencyLabel::Average => "Average",
            ConsistencyLabel::Inconsistent => "Inconsistent",
        };
        f.write_str(s)
    }
}

/// Combined insights for one student, ready for display or persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicInsights {
    pub predicted_sgpa: f64,
    pub predicted_cgpa: f64,
    pub confidence: f64,
    pub method: PredictionMethod,
    pub breakdown: PredictionBreakdown,
    pub recommended_subjects: Vec<String>,
    pub consistency_score: u8,
    pub consistency_label: ConsistencyLabel,
    pub strengths: Vec<String>,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
