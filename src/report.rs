use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::config::GradingConfig;
use crate::models::{letter_mix, GradedStudent, LetterGrade, SectionGroup, SectionSummary};

const FOLLOW_UP_LIMIT: usize = 5;

fn format_mix(mix: &BTreeMap<LetterGrade, usize>) -> String {
    mix.iter()
        .rev()
        .map(|(letter, count)| format!("{letter}: {count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn section_summaries(groups: &[SectionGroup]) -> Vec<SectionSummary> {
    let mut summaries: Vec<SectionSummary> = groups.iter().map(SectionGroup::summary).collect();
    summaries.sort_by(|a, b| a.section.cmp(&b.section));
    summaries
}

pub fn build_report(
    generated_on: NaiveDate,
    config: &GradingConfig,
    groups: &[SectionGroup],
) -> String {
    let summaries = section_summaries(groups);
    let students: Vec<&GradedStudent> = groups.iter().flat_map(|g| g.students.iter()).collect();

    let mut output = String::new();

    let _ = writeln!(output, "# Final Grade Report");
    let _ = writeln!(
        output,
        "Generated on {} for {} students across {} sections",
        generated_on,
        students.len(),
        summaries.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Weights");

    let total_weight: f64 = config.weights.values().sum();
    for (category, weight) in &config.weights {
        let _ = writeln!(output, "- {category}: {weight:.2}");
    }
    let _ = writeln!(output, "- total: {total_weight:.2}");
    let _ = writeln!(
        output,
        "- quiz schedule: {} quizzes, {} points",
        config.quiz_max_points.len(),
        config.quiz_total()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sections");

    if summaries.is_empty() {
        let _ = writeln!(output, "No students were graded.");
    } else {
        for summary in &summaries {
            let _ = writeln!(
                output,
                "- Section {}: {} students ({})",
                summary.section,
                summary.students,
                format_mix(&summary.letters)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Mix");

    if students.is_empty() {
        let _ = writeln!(output, "No grades assigned.");
    } else {
        let _ = writeln!(output, "{}", format_mix(&letter_mix(students.iter().copied())));
    }

    let mut lowest = students.clone();
    lowest.sort_by(|a, b| a.final_score.total_cmp(&b.final_score));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Students Needing Follow-up");

    let at_risk: Vec<_> = lowest
        .into_iter()
        .filter(|s| s.letter < LetterGrade::C)
        .take(FOLLOW_UP_LIMIT)
        .collect();
    if at_risk.is_empty() {
        let _ = writeln!(output, "No students below a C.");
    } else {
        for student in at_risk {
            let _ = writeln!(
                output,
                "- {} {} ({}, section {}) final {:.1}% grade {}",
                student.record.first_name,
                student.record.last_name,
                student.record.identifier,
                student.record.section,
                student.final_score * 100.0,
                student.letter
            );
        }
    }

    output
}
