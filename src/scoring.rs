//! Normalized [0, 1] category scores from raw earned/possible points.

use crate::config::GradingConfig;
use crate::error::GradebookError;
use crate::models::{exam_category, CategoryScores, StrategyScores, StudentRecord};

/// `earned / possible`, or 0 when nothing was possible.
pub fn ratio(earned: f64, possible: f64) -> f64 {
    let value = earned / possible;
    if possible > 0.0 && value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Sum of earned points over sum of possible points.
pub fn total_points(pairs: &[(f64, f64)]) -> f64 {
    let earned: f64 = pairs.iter().map(|(e, _)| e).sum();
    let possible: f64 = pairs.iter().map(|(_, p)| p).sum();
    ratio(earned, possible)
}

/// Mean of per-assignment ratios; 0 for an empty category.
pub fn average_of_ratios(pairs: &[(f64, f64)]) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    let sum: f64 = pairs.iter().map(|(e, p)| ratio(*e, *p)).sum();
    sum / pairs.len() as f64
}

/// Scores a category both ways and credits the student with the better one.
pub fn score_category(pairs: &[(f64, f64)]) -> StrategyScores {
    let total = total_points(pairs);
    let average = average_of_ratios(pairs);
    StrategyScores {
        total,
        average,
        best: total.max(average),
    }
}

/// `Homework 1` .. `Homework 99`; max-points and other columns are excluded.
pub fn is_homework(name: &str) -> bool {
    name.strip_prefix("Homework ").is_some_and(|n| {
        (1..=2).contains(&n.len()) && n.chars().all(|c| c.is_ascii_digit())
    })
}

pub fn homework_pairs(record: &StudentRecord) -> Vec<(f64, f64)> {
    record
        .assignments
        .iter()
        .filter(|(name, _)| is_homework(name))
        .map(|(_, score)| (score.earned(), score.possible()))
        .collect()
}

/// One pair per recorded quiz, with possible points from the schedule.
/// Quizzes without a loaded table are not included.
pub fn quiz_pairs(
    record: &StudentRecord,
    config: &GradingConfig,
) -> Result<Vec<(f64, f64)>, GradebookError> {
    record
        .quizzes
        .iter()
        .map(|(name, earned)| {
            let max = config
                .quiz_max_points
                .get(name)
                .ok_or_else(|| GradebookError::UnknownQuiz(name.clone()))?;
            let earned = (*earned).filter(|v| !v.is_nan()).unwrap_or(0.0);
            Ok((earned, *max))
        })
        .collect()
}

/// Total points are taken against the whole schedule; the average of ratios
/// only covers the quizzes that were recorded.
pub fn score_quizzes(
    record: &StudentRecord,
    config: &GradingConfig,
) -> Result<StrategyScores, GradebookError> {
    let pairs = quiz_pairs(record, config)?;
    let earned: f64 = pairs.iter().map(|(e, _)| e).sum();
    let total = ratio(earned, config.quiz_total());
    let average = average_of_ratios(&pairs);
    Ok(StrategyScores {
        total,
        average,
        best: total.max(average),
    })
}

pub fn exam_scores(
    record: &StudentRecord,
    config: &GradingConfig,
) -> Result<Vec<f64>, GradebookError> {
    (1..=config.exam_count)
        .map(|n| -> Result<f64, GradebookError> {
            let name = exam_category(n);
            let score = record
                .assignments
                .get(&name)
                .ok_or_else(|| GradebookError::MissingColumn {
                    table: "grades".into(),
                    column: name.clone(),
                })?;
            Ok(ratio(score.earned(), score.possible()))
        })
        .collect()
}

pub fn score_student(
    record: &StudentRecord,
    config: &GradingConfig,
) -> Result<CategoryScores, GradebookError> {
    Ok(CategoryScores {
        exams: exam_scores(record, config)?,
        homework: score_category(&homework_pairs(record)),
        quiz: score_quizzes(record, config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawScore;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn record(assignments: &[(&str, f64, f64)], quizzes: &[(&str, f64)]) -> StudentRecord {
        StudentRecord {
            identifier: "a1".into(),
            assignments: assignments
                .iter()
                .map(|(n, e, p)| (n.to_string(), RawScore::new(*e, *p)))
                .collect(),
            quizzes: quizzes
                .iter()
                .map(|(n, e)| (n.to_string(), Some(*e)))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn strategies_disagree_and_best_wins() {
        // 10/10 on a small assignment, 50/100 on a large one.
        let pairs = [(10.0, 10.0), (50.0, 100.0)];
        let scores = score_category(&pairs);
        assert!(close(scores.total, 60.0 / 110.0));
        assert!(close(scores.average, 0.75));
        assert!(close(scores.best, 0.75));

        let pairs = [(0.0, 10.0), (100.0, 100.0)];
        let scores = score_category(&pairs);
        assert!(close(scores.total, 100.0 / 110.0));
        assert!(close(scores.average, 0.5));
        assert_eq!(scores.best, scores.total);
    }

    #[test]
    fn empty_category_scores_zero() {
        let scores = score_category(&[]);
        assert_eq!(scores, StrategyScores::default());
        assert!(!scores.best.is_nan());
    }

    #[test]
    fn zero_possible_points_is_not_nan() {
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(total_points(&[(0.0, 0.0)]), 0.0);
    }

    #[test]
    fn homework_columns_are_recognized_by_name() {
        assert!(is_homework("Homework 1"));
        assert!(is_homework("Homework 10"));
        assert!(!is_homework("Homework 100"));
        assert!(!is_homework("Homework "));
        assert!(!is_homework("Homework 1 - Max Points"));
        assert!(!is_homework("Homework"));
        assert!(!is_homework("Exam 1"));
    }

    #[test]
    fn no_homework_rows_gives_zero_homework_score() {
        let rec = record(&[("Exam 1", 1.0, 1.0)], &[]);
        let config = GradingConfig {
            exam_count: 1,
            ..GradingConfig::default()
        };
        let scores = score_student(&rec, &config).unwrap();
        assert_eq!(scores.homework.best, 0.0);
        assert_eq!(scores.exams, vec![1.0]);
    }

    #[test]
    fn quiz_possible_points_come_from_schedule() {
        let rec = record(&[], &[("Quiz 1", 11.0), ("Quiz 3", 17.0)]);
        let config = GradingConfig::default();
        let pairs = quiz_pairs(&rec, &config).unwrap();
        assert_eq!(pairs, vec![(11.0, 11.0), (17.0, 17.0)]);

        let scores = score_quizzes(&rec, &config).unwrap();
        assert!(close(scores.total, 28.0 / 69.0));
        assert!(close(scores.average, 1.0));
        assert_eq!(scores.best, scores.average);
    }

    #[test]
    fn partial_quiz_files_use_separate_denominators() {
        // Quiz 4 and Quiz 5 were never loaded.
        let rec = StudentRecord {
            quizzes: [("Quiz 1", Some(11.0)), ("Quiz 2", None), ("Quiz 3", Some(8.5))]
                .into_iter()
                .map(|(n, e)| (n.to_string(), e))
                .collect(),
            ..Default::default()
        };
        let scores = score_quizzes(&rec, &GradingConfig::default()).unwrap();
        assert!(close(scores.total, 19.5 / 69.0));
        assert!(close(scores.average, (1.0 + 0.0 + 0.5) / 3.0));
        assert_eq!(scores.best, scores.average);
    }

    #[test]
    fn no_quiz_tables_scores_zero() {
        let rec = record(&[], &[]);
        let scores = score_quizzes(&rec, &GradingConfig::default()).unwrap();
        assert_eq!(scores, StrategyScores::default());
    }

    #[test]
    fn unscheduled_quiz_is_error() {
        let rec = record(&[], &[("Quiz 9", 3.0)]);
        let err = quiz_pairs(&rec, &GradingConfig::default()).unwrap_err();
        assert_eq!(err, GradebookError::UnknownQuiz("Quiz 9".into()));
    }

    #[test]
    fn missing_exam_column_is_structural_error() {
        let rec = record(&[("Exam 1", 1.0, 1.0)], &[]);
        let err = exam_scores(&rec, &GradingConfig::default()).unwrap_err();
        assert_eq!(
            err,
            GradebookError::MissingColumn {
                table: "grades".into(),
                column: "Exam 2".into(),
            }
        );
    }

    #[test]
    fn scores_stay_within_unit_interval() {
        let rec = record(
            &[
                ("Exam 1", 45.0, 50.0),
                ("Exam 2", 80.0, 100.0),
                ("Exam 3", 0.0, 100.0),
                ("Homework 1", 3.0, 80.0),
                ("Homework 2", 70.0, 70.0),
                ("Homework 3", 0.0, 0.0),
            ],
            &[("Quiz 1", 11.0), ("Quiz 2", 2.0)],
        );
        let scores = score_student(&rec, &GradingConfig::default()).unwrap();
        for value in scores
            .exams
            .iter()
            .chain([&scores.homework.best, &scores.quiz.best])
        {
            assert!((0.0..=1.0).contains(value), "{value} out of range");
        }
        assert_eq!(
            scores.homework.best,
            scores.homework.total.max(scores.homework.average)
        );
        assert_eq!(scores.quiz.best, scores.quiz.total.max(scores.quiz.average));
    }
}
