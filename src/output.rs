//! Writes one CSV per section.

use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::info;

use crate::error::GradebookError;
use crate::models::{exam_category, GradedStudent, SectionGroup};

pub fn section_file_name(section: &str) -> String {
    let label: String = section
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("Section {label} Grades.csv")
}

/// Assignment, quiz and exam columns come from `sample`; without one only the
/// fixed columns are emitted.
fn header(sample: Option<&GradedStudent>) -> Vec<String> {
    let mut columns: Vec<String> = ["NetID", "Email Address", "Section", "First Name", "Last Name"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    if let Some(sample) = sample {
        for name in sample.record.assignments.keys() {
            columns.push(name.clone());
            columns.push(format!("{name} - Max Points"));
        }
        columns.extend(sample.record.quizzes.keys().cloned());
        for n in 1..=sample.scores.exams.len() {
            columns.push(format!("{} Score", exam_category(n)));
        }
    }
    columns.extend(
        [
            "Total Homework",
            "Average Homework",
            "Homework Score",
            "Total Quizzes",
            "Average Quizzes",
            "Quiz Score",
            "Final Score",
            "Ceiling Score",
            "Final Grade",
        ]
        .iter()
        .map(|c| c.to_string()),
    );
    columns
}

fn row(student: &GradedStudent) -> Vec<String> {
    let record = &student.record;
    let mut values = vec![
        record.identifier.clone(),
        record.email.clone(),
        record.section.clone(),
        record.first_name.clone(),
        record.last_name.clone(),
    ];
    for score in record.assignments.values() {
        values.push(score.earned().to_string());
        values.push(score.possible().to_string());
    }
    for earned in record.quizzes.values() {
        values.push(earned.unwrap_or(0.0).to_string());
    }
    values.extend(student.scores.exams.iter().map(f64::to_string));
    let homework = &student.scores.homework;
    let quiz = &student.scores.quiz;
    values.extend(
        [
            homework.total,
            homework.average,
            homework.best,
            quiz.total,
            quiz.average,
            quiz.best,
            student.final_score,
            student.ceiling_score,
        ]
        .iter()
        .map(f64::to_string),
    );
    values.push(student.letter.to_string());
    values
}

pub fn write_section(dir: &Path, group: &SectionGroup) -> Result<PathBuf, GradebookError> {
    let path = dir.join(section_file_name(&group.section));
    let mut writer = Writer::from_path(&path)?;

    writer.write_record(header(group.students.first()))?;
    for student in &group.students {
        writer.write_record(row(student))?;
    }
    writer.flush()?;

    info!(
        section = %group.section,
        students = group.len(),
        path = %path.display(),
        "Saved section grades"
    );
    Ok(path)
}

pub fn write_sections(dir: &Path, groups: &[SectionGroup]) -> Result<Vec<PathBuf>, GradebookError> {
    std::fs::create_dir_all(dir)?;
    groups.iter().map(|group| write_section(dir, group)).collect()
}
