//! Weighted final score, letter grade, and the end-to-end grading pipeline.

use std::collections::BTreeMap;

use crate::config::{GradeThreshold, GradingConfig};
use crate::error::GradebookError;
use crate::join::{fill_missing, join_records, GradeRow, QuizTable, RosterRow};
use crate::models::{CategoryScores, GradedStudent, LetterGrade, StudentRecord};
use crate::scoring::score_student;

/// Σ score × weight over the weighted categories. No renormalization.
pub fn final_score(scores: &CategoryScores, weights: &BTreeMap<String, f64>) -> f64 {
    weights
        .iter()
        .filter_map(|(category, weight)| scores.get(category).map(|score| score * weight))
        .sum()
}

/// Final score on a 0-100 scale rounded up. Only used for thresholding.
pub fn ceiling_score(final_score: f64) -> f64 {
    (final_score * 100.0).ceil()
}

/// First threshold (highest first) the score meets. Anything below every
/// threshold, NaN included, is an F.
pub fn letter_for(ceiling: f64, descending: &[GradeThreshold]) -> LetterGrade {
    descending
        .iter()
        .find(|threshold| ceiling >= threshold.min)
        .map(|threshold| threshold.letter)
        .unwrap_or(LetterGrade::F)
}

pub fn grade_student(
    record: StudentRecord,
    config: &GradingConfig,
    descending: &[GradeThreshold],
) -> Result<GradedStudent, GradebookError> {
    let scores = score_student(&record, config)?;
    let final_score = final_score(&scores, &config.weights);
    let ceiling_score = ceiling_score(final_score);
    Ok(GradedStudent {
        record,
        scores,
        final_score,
        ceiling_score,
        letter: letter_for(ceiling_score, descending),
    })
}

/// Join, fill, score and grade. Any structural error aborts the whole run.
pub fn grade_students(
    roster: &[RosterRow],
    grades: &[GradeRow],
    quizzes: &[QuizTable],
    config: &GradingConfig,
) -> Result<Vec<GradedStudent>, GradebookError> {
    config.validate()?;
    let mut records = join_records(roster, grades, quizzes)?;
    fill_missing(&mut records);

    let descending = config.thresholds_descending();
    records
        .into_iter()
        .map(|record| grade_student(record, config, &descending))
        .collect()
}
