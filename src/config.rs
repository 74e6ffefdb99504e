use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GradebookError;
use crate::models::{exam_category, LetterGrade, HOMEWORK, QUIZ};

/// Inclusive lower bound on the ceiling score for a letter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeThreshold {
    pub min: f64,
    pub letter: LetterGrade,
}

/// Course configuration consumed by the scorer and aggregator.
///
/// Weights are used as given; a total other than 1.0 is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    pub exam_count: usize,
    /// Maximum points per quiz, keyed by quiz name (`Quiz 1`, ...).
    pub quiz_max_points: BTreeMap<String, f64>,
    /// Weight per category (`Exam 1`, ..., `Homework`, `Quiz`).
    pub weights: BTreeMap<String, f64>,
    pub thresholds: Vec<GradeThreshold>,
}

impl Default for GradingConfig {
    fn default() -> Self {
        let quiz_max_points = [
            ("Quiz 1", 11.0),
            ("Quiz 2", 15.0),
            ("Quiz 3", 17.0),
            ("Quiz 4", 14.0),
            ("Quiz 5", 12.0),
        ]
        .into_iter()
        .map(|(name, max)| (name.to_string(), max))
        .collect();

        let weights = [
            ("Exam 1", 0.05),
            ("Exam 2", 0.10),
            ("Exam 3", 0.15),
            (QUIZ, 0.30),
            (HOMEWORK, 0.40),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

        let thresholds = vec![
            GradeThreshold { min: 90.0, letter: LetterGrade::A },
            GradeThreshold { min: 80.0, letter: LetterGrade::B },
            GradeThreshold { min: 70.0, letter: LetterGrade::C },
            GradeThreshold { min: 60.0, letter: LetterGrade::D },
            GradeThreshold { min: 0.0, letter: LetterGrade::F },
        ];

        Self {
            exam_count: 3,
            quiz_max_points,
            weights,
            thresholds,
        }
    }
}

impl GradingConfig {
    pub fn from_toml(input: &str) -> Result<Self, GradebookError> {
        let config: GradingConfig =
            toml::from_str(input).map_err(|e| GradebookError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, GradebookError> {
        toml::to_string_pretty(self).map_err(|e| GradebookError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), GradebookError> {
        if self.exam_count == 0 {
            return Err(GradebookError::ConfigValidation(
                "exam_count must be at least 1".into(),
            ));
        }

        for (quiz, max) in &self.quiz_max_points {
            if !max.is_finite() || *max <= 0.0 {
                return Err(GradebookError::ConfigValidation(format!(
                    "quiz '{quiz}' must have positive max points, got {max}"
                )));
            }
        }

        let known = self.categories();
        for (category, weight) in &self.weights {
            if !known.contains(category) {
                return Err(GradebookError::ConfigValidation(format!(
                    "weight for unknown category '{category}'"
                )));
            }
            if !weight.is_finite() || *weight < 0.0 {
                return Err(GradebookError::ConfigValidation(format!(
                    "category '{category}' has invalid weight {weight}"
                )));
            }
        }

        if self.thresholds.is_empty() {
            return Err(GradebookError::ConfigValidation(
                "at least one grade threshold is required".into(),
            ));
        }
        if let Some(bad) = self.thresholds.iter().find(|t| !t.min.is_finite()) {
            return Err(GradebookError::ConfigValidation(format!(
                "threshold for {} must be finite",
                bad.letter
            )));
        }
        let descending = self.thresholds_descending();
        if descending.windows(2).any(|w| w[0].letter < w[1].letter) {
            return Err(GradebookError::ConfigValidation(
                "a higher threshold must not map to a lower letter".into(),
            ));
        }

        Ok(())
    }

    /// Every category a score can be computed for.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = (1..=self.exam_count).map(exam_category).collect();
        categories.push(HOMEWORK.to_string());
        categories.push(QUIZ.to_string());
        categories
    }

    /// Thresholds ordered from highest to lowest bound.
    pub fn thresholds_descending(&self) -> Vec<GradeThreshold> {
        let mut thresholds = self.thresholds.clone();
        thresholds.sort_by(|a, b| b.min.total_cmp(&a.min));
        thresholds
    }

    pub fn quiz_total(&self) -> f64 {
        self.quiz_max_points.values().sum()
    }
}
