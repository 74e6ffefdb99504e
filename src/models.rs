use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const HOMEWORK: &str = "Homework";
pub const QUIZ: &str = "Quiz";

/// Category name of the n-th exam (1-based), e.g. `Exam 2`.
pub fn exam_category(n: usize) -> String {
    format!("Exam {n}")
}

/// Earned and possible points for one assignment. `None` marks a cell that was
/// absent in the source table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawScore {
    pub earned: Option<f64>,
    pub possible: Option<f64>,
}

impl RawScore {
    pub fn new(earned: f64, possible: f64) -> Self {
        Self {
            earned: Some(earned),
            possible: Some(possible),
        }
    }

    pub fn fill_missing(&mut self) {
        *self = Self::new(self.earned(), self.possible());
    }

    pub fn earned(&self) -> f64 {
        self.earned.filter(|v| !v.is_nan()).unwrap_or(0.0)
    }

    pub fn possible(&self) -> f64 {
        self.possible.filter(|v| !v.is_nan()).unwrap_or(0.0)
    }
}

/// One joined row, keyed by the lowercase `identifier`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudentRecord {
    pub identifier: String,
    pub email: String,
    pub section: String,
    pub first_name: String,
    pub last_name: String,
    pub assignments: BTreeMap<String, RawScore>,
    /// Earned quiz points; the possible points live in the quiz schedule.
    pub quizzes: BTreeMap<String, Option<f64>>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LetterGrade {
    F,
    D,
    C,
    B,
    A,
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(letter)
    }
}

/// Both competing strategies for a multi-assignment category and the
/// score actually credited.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StrategyScores {
    pub total: f64,
    pub average: f64,
    pub best: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CategoryScores {
    /// Index 0 holds Exam 1.
    pub exams: Vec<f64>,
    pub homework: StrategyScores,
    pub quiz: StrategyScores,
}

impl CategoryScores {
    pub fn get(&self, category: &str) -> Option<f64> {
        match category {
            HOMEWORK => Some(self.homework.best),
            QUIZ => Some(self.quiz.best),
            other => {
                let n: usize = other.strip_prefix("Exam ")?.parse().ok()?;
                self.exams.get(n.checked_sub(1)?).copied()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradedStudent {
    pub record: StudentRecord,
    pub scores: CategoryScores,
    pub final_score: f64,
    pub ceiling_score: f64,
    pub letter: LetterGrade,
}

#[derive(Debug, Clone)]
pub struct SectionGroup {
    pub section: String,
    pub students: Vec<GradedStudent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSummary {
    pub section: String,
    pub students: usize,
    pub letters: BTreeMap<LetterGrade, usize>,
}

impl SectionGroup {
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn summary(&self) -> SectionSummary {
        SectionSummary {
            section: self.section.clone(),
            students: self.len(),
            letters: letter_mix(&self.students),
        }
    }
}

/// Number of students holding each letter.
pub fn letter_mix<'a, I>(students: I) -> BTreeMap<LetterGrade, usize>
where
    I: IntoIterator<Item = &'a GradedStudent>,
{
    let mut mix = BTreeMap::new();
    for student in students {
        *mix.entry(student.letter).or_insert(0) += 1;
    }
    mix
}
