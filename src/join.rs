//! Merges the roster, homework/exam and quiz tables into one row per student.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::GradebookError;
use crate::models::{RawScore, StudentRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow {
    pub identifier: String,
    pub email: String,
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradeRow {
    pub identifier: String,
    pub first_name: String,
    pub last_name: String,
    pub assignments: BTreeMap<String, RawScore>,
}

/// Earned points for a single quiz keyed by student email.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizTable {
    pub name: String,
    pub grades: BTreeMap<String, Option<f64>>,
}

/// Case-insensitive join key.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Inner-joins roster and grades on identifier, then inner-joins the union of
/// all quiz tables on the roster email. Cells are left unfilled; see
/// [`fill_missing`].
pub fn join_records(
    roster: &[RosterRow],
    grades: &[GradeRow],
    quizzes: &[QuizTable],
) -> Result<Vec<StudentRecord>, GradebookError> {
    let mut grades_by_id: BTreeMap<String, &GradeRow> = BTreeMap::new();
    let mut assignment_names: BTreeSet<&str> = BTreeSet::new();
    for row in grades {
        let key = normalize_key(&row.identifier);
        assignment_names.extend(row.assignments.keys().map(String::as_str));
        if grades_by_id.insert(key.clone(), row).is_some() {
            return Err(GradebookError::DuplicateIdentifier {
                table: "grades".into(),
                identifier: key,
            });
        }
    }

    let quiz_by_email = union_quizzes(quizzes)?;
    let quiz_names: Vec<&str> = quizzes.iter().map(|q| q.name.as_str()).collect();

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut records = Vec::new();
    let mut missing_grades = 0usize;
    let mut missing_quizzes = 0usize;

    for entry in roster {
        let identifier = normalize_key(&entry.identifier);
        if !seen.insert(identifier.clone()) {
            return Err(GradebookError::DuplicateIdentifier {
                table: "roster".into(),
                identifier,
            });
        }

        let Some(grade_row) = grades_by_id.get(&identifier) else {
            missing_grades += 1;
            continue;
        };

        let email = normalize_key(&entry.email);
        let quiz_cells = if quizzes.is_empty() {
            None
        } else {
            match quiz_by_email.get(&email) {
                Some(cells) => Some(cells),
                None => {
                    missing_quizzes += 1;
                    continue;
                }
            }
        };

        let assignments = assignment_names
            .iter()
            .map(|name| {
                let score = grade_row.assignments.get(*name).copied().unwrap_or_default();
                (name.to_string(), score)
            })
            .collect();

        let quiz_scores = quiz_names
            .iter()
            .map(|name| {
                let earned = quiz_cells.and_then(|cells| cells.get(*name).copied().flatten());
                (name.to_string(), earned)
            })
            .collect();

        records.push(StudentRecord {
            identifier,
            email,
            section: entry.section.trim().to_string(),
            first_name: grade_row.first_name.clone(),
            last_name: grade_row.last_name.clone(),
            assignments,
            quizzes: quiz_scores,
        });
    }

    debug!(
        joined = records.len(),
        missing_grades, missing_quizzes, "Joined student records"
    );
    Ok(records)
}

/// Column-wise union of quiz tables: email -> quiz name -> earned points.
fn union_quizzes(
    quizzes: &[QuizTable],
) -> Result<BTreeMap<String, BTreeMap<String, Option<f64>>>, GradebookError> {
    let mut names = BTreeSet::new();
    let mut by_email: BTreeMap<String, BTreeMap<String, Option<f64>>> = BTreeMap::new();

    for quiz in quizzes {
        if !names.insert(quiz.name.as_str()) {
            return Err(GradebookError::DuplicateIdentifier {
                table: "quizzes".into(),
                identifier: quiz.name.clone(),
            });
        }
        let mut emails = BTreeSet::new();
        for (email, earned) in &quiz.grades {
            let email = normalize_key(email);
            if !emails.insert(email.clone()) {
                return Err(GradebookError::DuplicateIdentifier {
                    table: quiz.name.clone(),
                    identifier: email,
                });
            }
            by_email
                .entry(email)
                .or_default()
                .insert(quiz.name.clone(), *earned);
        }
    }

    Ok(by_email)
}

/// Sets every absent score cell to zero.
pub fn fill_missing(records: &mut [StudentRecord]) {
    for record in records {
        for score in record.assignments.values_mut() {
            score.fill_missing();
        }
        for earned in record.quizzes.values_mut() {
            *earned = Some(earned.filter(|v| !v.is_nan()).unwrap_or(0.0));
        }
    }
}
