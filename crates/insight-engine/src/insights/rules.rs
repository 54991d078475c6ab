//! Rule-based strengths, warnings, and subject recommendations
//!
//! Deterministic generators over the semester history, independent of the
//! forecasting models.

use crate::models::SemesterRecord;
use std::collections::BTreeMap;

/// Maximum number of recommended subjects returned
const MAX_RECOMMENDATIONS: usize = 5;

/// Average grade point below which a subject needs attention
const WEAK_GRADE_POINT: f64 = 8.0;

/// Subject attendance below which a subject needs attention
const WEAK_SUBJECT_ATTENDANCE: f64 = 80.0;

/// CGPA from which a student counts as a high achiever
const HIGH_ACHIEVER_CGPA: f64 = 8.5;

/// Mean attendance for an excellent-attendance strength
const EXCELLENT_ATTENDANCE: f64 = 90.0;

/// Attendance threshold below which warnings fire
const LOW_ATTENDANCE: f64 = 75.0;

/// Semester-over-semester attendance drop that triggers a warning
const ATTENDANCE_DROP: f64 = 8.0;

fn sorted_history(history: &[SemesterRecord]) -> Vec<SemesterRecord> {
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|s| s.semester_number);
    sorted
}

#[derive(Default)]
struct SubjectAggregate {
    total_points: f64,
    count: u32,
    latest_attendance: Option<f64>,
}

/// Subjects that deserve focused revision, weakest first.
///
/// A subject is flagged when its average grade point falls below 8 or its
/// latest recorded attendance is under 80%; at most five names are returned.
pub fn recommended_subjects(history: &[SemesterRecord]) -> Vec<String> {
    let sorted = sorted_history(history);

    let mut by_name: BTreeMap<&str, SubjectAggregate> = BTreeMap::new();
    for sem in &sorted {
        for subject in &sem.subjects {
            let agg = by_name.entry(subject.name.as_str()).or_default();
            agg.total_points += subject.grade_point;
            agg.count += 1;
            if let Some(attendance) = subject.attendance_percentage {
                agg.latest_attendance = Some(attendance);
            }
        }
    }

    let mut flagged: Vec<(String, f64)> = by_name
        .into_iter()
        .filter_map(|(name, agg)| {
            let avg = agg.total_points / f64::from(agg.count.max(1));
            let attendance = agg.latest_attendance.unwrap_or(100.0);
            (avg < WEAK_GRADE_POINT || attendance < WEAK_SUBJECT_ATTENDANCE)
                .then(|| (name.to_string(), avg))
        })
        .collect();

    flagged.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    flagged
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|(name, _)| name)
        .collect()
}

/// Positive highlights of the record, in a fixed order
pub fn strengths(history: &[SemesterRecord]) -> Vec<String> {
    let mut out = Vec::new();
    if history.is_empty() {
        return out;
    }
    let sorted = sorted_history(history);

    let first_cgpa = sorted[0].cgpa_after_semester;
    let last_cgpa = sorted[sorted.len() - 1].cgpa_after_semester;
    let total_backlogs: u32 = sorted.iter().map(|s| s.backlogs).sum();
    let avg_attendance =
        sorted.iter().map(|s| s.overall_attendance).sum::<f64>() / sorted.len() as f64;

    if last_cgpa >= HIGH_ACHIEVER_CGPA {
        out.push("High academic achiever (CGPA ≥ 8.5)".to_string());
    }
    if sorted.len() > 1 && last_cgpa > first_cgpa {
        out.push("Consistent upward CGPA trend".to_string());
    }
    if total_backlogs == 0 {
        out.push("Zero backlogs throughout program".to_string());
    }
    if avg_attendance >= EXCELLENT_ATTENDANCE {
        out.push("Excellent attendance record".to_string());
    }
    out
}

/// Risk signals in the record, in a fixed order
pub fn warnings(history: &[SemesterRecord]) -> Vec<String> {
    let mut out = Vec::new();
    if history.is_empty() {
        return out;
    }
    let sorted = sorted_history(history);
    let n = sorted.len();

    let total_backlogs: u32 = sorted.iter().map(|s| s.backlogs).sum();
    let avg_attendance =
        sorted.iter().map(|s| s.overall_attendance).sum::<f64>() / n as f64;

    if total_backlogs > 0 {
        out.push(format!("{total_backlogs} backlog(s) need to be cleared"));
    }
    if avg_attendance < LOW_ATTENDANCE {
        out.push("Overall attendance below 75% threshold".to_string());
    }
    if n > 1 {
        let drop = sorted[n - 1].overall_attendance - sorted[n - 2].overall_attendance;
        if drop < -ATTENDANCE_DROP {
            out.push("Attendance has dropped significantly in recent semester".to_string());
        }
    }

    let latest = &sorted[n - 1];
    let low_attendance_subjects = latest
        .subjects
        .iter()
        .filter(|s| s.attendance_percentage.map_or(false, |a| a < LOW_ATTENDANCE))
        .count();
    if low_attendance_subjects > 0 {
        out.push(format!(
            "{low_attendance_subjects} subject(s) with attendance below 75%"
        ));
    }

    if n >= 3 {
        let recent: Vec<f64> = sorted[n - 3..]
            .iter()
            .map(|s| s.cgpa_after_semester)
            .collect();
        if recent[2] < recent[1] && recent[1] < recent[0] {
            out.push("CGPA has been declining for the last 3 semesters".to_string());
        }
    }
    out
}
