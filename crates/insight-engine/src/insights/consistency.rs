//! Consistency scoring
//!
//! Composite 0-100 score from SGPA spread, trend direction, attendance
//! stability, and accumulated backlogs.

use crate::models::{ConsistencyLabel, SemesterRecord};
use crate::predictor::{linear_regression_slope, mean, std_dev};

/// Neutral score returned when fewer than two semesters exist
const NEUTRAL_SCORE: u8 = 50;

/// Weighted composite scorer over a semester history
///
/// Default weights: 40% SGPA spread, 30% trend, 20% attendance stability,
/// 10% backlog penalty.
#[derive(Debug, Clone)]
pub struct ConsistencyScorer {
    pub variance_weight: f64,
    pub trend_weight: f64,
    pub attendance_weight: f64,
    pub backlog_weight: f64,
}

impl Default for ConsistencyScorer {
    fn default() -> Self {
        Self {
            variance_weight: 0.4,
            trend_weight: 0.3,
            attendance_weight: 0.2,
            backlog_weight: 0.1,
        }
    }
}

impl ConsistencyScorer {
    /// Score a (possibly unsorted) history; fewer than two semesters yield
    /// the neutral default.
    pub fn score(&self, history: &[SemesterRecord]) -> u8 {
        if history.len() < 2 {
            return NEUTRAL_SCORE;
        }

        let mut sorted = history.to_vec();
        sorted.sort_by_key(|s| s.semester_number);

        let sgpa: Vec<f64> = sorted.iter().map(|s| s.sgpa).collect();
        let attendance: Vec<f64> = sorted.iter().map(|s| s.overall_attendance).collect();

        // Lower SGPA spread scores higher
        let variance_score = (100.0 - (std_dev(&sgpa) / 2.0) * 100.0).max(0.0);

        let x: Vec<f64> = (1..=sorted.len()).map(|i| i as f64).collect();
        let slope = linear_regression_slope(&x, &sgpa);
        let trend_score = if slope >= 0.2 {
            100.0
        } else if slope >= 0.0 {
            60.0 + (slope / 0.2) * 40.0
        } else if slope >= -0.2 {
            40.0 + ((slope + 0.2) / 0.2) * 20.0
        } else {
            (40.0 + slope * 100.0).max(0.0)
        };

        let attendance_score = (mean(&attendance) / 100.0) * 70.0
            + (30.0 - (std_dev(&attendance) / 20.0) * 30.0).max(0.0);

        let total_backlogs: u32 = sorted.iter().map(|s| s.backlogs).sum();
        let backlog_score = (100.0 - f64::from(total_backlogs) * 20.0).max(0.0);

        let composite = variance_score * self.variance_weight
            + trend_score * self.trend_weight
            + attendance_score * self.attendance_weight
            + backlog_score * self.backlog_weight;

        composite.clamp(0.0, 100.0).round() as u8
    }
}

impl ConsistencyLabel {
    /// Band mapping for a consistency score
    pub fn from_score(score: u8) -> Self {
        if score >= 85 {
            ConsistencyLabel::Excellent
        } else if score >= 65 {
            ConsistencyLabel::Good
        } else if score >= 45 {
            ConsistencyLabel::Average
        } else {
            ConsistencyLabel::Inconsistent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semester(
        number: u32,
        sgpa: f64,
        attendance: f64,
        backlogs: u32,
    ) -> SemesterRecord {
        SemesterRecord {
            semester_number: number,
            sgpa,
            cgpa_after_semester: sgpa,
            total_credits: 20,
            earned_credits: 20,
            overall_attendance: attendance,
            backlogs,
            subjects: Vec::new(),
        }
    }

    #[test]
    fn test_insufficient_history_neutral() {
        let scorer = ConsistencyScorer::default();
        assert_eq!(scorer.score(&[]), 50);
        assert_eq!(scorer.score(&[semester(1, 8.0, 90.0, 0)]), 50);
    }

    #[test]
    fn test_flat_series_composite() {
        // Perfectly flat SGPAs at full attendance, no backlogs:
        // variance 100, trend 60 (zero slope), attendance 100, backlog 100
        // -> 40 + 18 + 20 + 10 = 88
        let scorer = ConsistencyScorer::default();
        let history: Vec<_> = (1..=3).map(|i| semester(i, 8.0, 100.0, 0)).collect();
        assert_eq!(scorer.score(&history), 88);
    }

    #[test]
    fn test_steep_decline_scores_low() {
        let scorer = ConsistencyScorer::default();
        let history = vec![
            semester(1, 9.0, 90.0, 0),
            semester(2, 8.0, 90.0, 0),
            semester(3, 7.0, 90.0, 0),
        ];
        // stddev sqrt(2/3) -> variance score ~59.18; slope -1 -> trend 0;
        // attendance 63 + 30 = 93; backlogs 100
        assert_eq!(scorer.score(&history), 52);
    }

    #[test]
    fn test_backlogs_drag_score() {
        let scorer = ConsistencyScorer::default();
        let clean: Vec<_> = (1..=4).map(|i| semester(i, 7.5, 90.0, 0)).collect();
        let burdened: Vec<_> = (1..=4).map(|i| semester(i, 7.5, 90.0, 2)).collect();
        assert!(scorer.score(&clean) > scorer.score(&burdened));
    }

    #[test]
    fn test_rising_trend_maxes_trend_score() {
        let scorer = ConsistencyScorer::default();
        // Slope 0.5 per semester saturates the trend sub-score
        let history: Vec<_> = (1..=4)
            .map(|i| semester(i, 6.0 + 0.5 * f64::from(i - 1), 100.0, 0))
            .collect();
        // stddev of [6, 6.5, 7, 7.5] = sqrt(0.3125) ~ 0.559 -> variance 72.05
        // composite = 72.05*0.4 + 100*0.3 + 100*0.2 + 100*0.1 = 88.8 -> 89
        assert_eq!(scorer.score(&history), 89);
    }

    #[test]
    fn test_order_independent() {
        let scorer = ConsistencyScorer::default();
        let ordered = vec![
            semester(1, 6.0, 85.0, 0),
            semester(2, 7.0, 88.0, 1),
            semester(3, 8.0, 91.0, 0),
        ];
        let mut shuffled = ordered.clone();
        shuffled.reverse();
        assert_eq!(scorer.score(&ordered), scorer.score(&shuffled));
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(ConsistencyLabel::from_score(85), ConsistencyLabel::Excellent);
        assert_eq!(ConsistencyLabel::from_score(84), ConsistencyLabel::Good);
        assert_eq!(ConsistencyLabel::from_score(65), ConsistencyLabel::Good);
        assert_eq!(ConsistencyLabel::from_score(64), ConsistencyLabel::Average);
        assert_eq!(ConsistencyLabel::from_score(45), ConsistencyLabel::Average);
        assert_eq!(ConsistencyLabel::from_score(44), ConsistencyLabel::Inconsistent);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let scorer = ConsistencyScorer::default();
        let total = scorer.variance_weight
            + scorer.trend_weight
            + scorer.attendance_weight
            + scorer.backlog_weight;
        assert!((total - 1.0).abs() < 1e-12);
    }
}
