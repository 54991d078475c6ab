//! Derived insights: consistency scoring and rule-based feedback

mod consistency;
mod rules;

pub use consistency::ConsistencyScorer;
pub use rules::{recommended_subjects, strengths, warnings};

use crate::models::{AcademicInsights, ConsistencyLabel, SemesterRecord};
use crate::predictor::PredictionEngine;
use chrono::Utc;

/// Run the full insight pipeline over one student's history.
///
/// Bundles the default-configured prediction engine, the consistency scorer,
/// and the rule generators into the single object collaborating layers
/// persist and display.
pub fn generate_insights(history: &[SemesterRecord]) -> AcademicInsights {
    let prediction = PredictionEngine::new().predict(history);
    let score = ConsistencyScorer::default().score(history);

    AcademicInsights {
        predicted_sgpa: prediction.predicted_sgpa,
        predicted_cgpa: prediction.predicted_cgpa,
        confidence: prediction.confidence,
        method: prediction.method,
        breakdown: prediction.breakdown,
        recommended_subjects: recommended_subjects(history),
        consistency_score: score,
        consistency_label: ConsistencyLabel::from_score(score),
        strengths: strengths(history),
        warnings: warnings(history),
        generated_at: Utc::now(),
    }
}
