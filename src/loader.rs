//! Reads the roster, homework/exam and quiz CSV files from a data directory.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::GradebookError;
use crate::join::{normalize_key, GradeRow, QuizTable, RosterRow};
use crate::models::RawScore;

pub const ROSTER_FILE: &str = "roster.csv";
pub const GRADES_FILE: &str = "hw_exam_grades.csv";
const MAX_POINTS_SUFFIX: &str = " - Max Points";

/// The three parsed input tables.
#[derive(Debug, Clone, Default)]
pub struct GradebookInput {
    pub roster: Vec<RosterRow>,
    pub grades: Vec<GradeRow>,
    pub quizzes: Vec<QuizTable>,
}

pub fn load_data_dir(dir: &Path) -> Result<GradebookInput, GradebookError> {
    let roster = parse_roster(&read_file(&dir.join(ROSTER_FILE))?)?;
    info!(rows = roster.len(), "Loaded roster");

    let grades = parse_grades(&read_file(&dir.join(GRADES_FILE))?)?;
    info!(rows = grades.len(), "Loaded homework and exam grades");

    let mut quiz_files: Vec<(String, std::path::PathBuf)> = std::fs::read_dir(dir)
        .map_err(|e| GradebookError::Io(format!("{}: {e}", dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            quiz_name_from_stem(stem).map(|name| (name, path.clone()))
        })
        .collect();
    quiz_files.sort();

    let mut quizzes = Vec::with_capacity(quiz_files.len());
    for (name, path) in quiz_files {
        let quiz = parse_quiz(&name, &read_file(&path)?)?;
        debug!(quiz = %name, rows = quiz.grades.len(), "Loaded quiz");
        quizzes.push(quiz);
    }
    info!(quizzes = quizzes.len(), "Loaded quiz grades");

    Ok(GradebookInput {
        roster,
        grades,
        quizzes,
    })
}

fn read_file(path: &Path) -> Result<String, GradebookError> {
    std::fs::read_to_string(path).map_err(|e| GradebookError::Io(format!("{}: {e}", path.display())))
}

/// `quiz_3_grades` -> `Quiz 3`.
pub fn quiz_name_from_stem(stem: &str) -> Option<String> {
    let number = stem.strip_prefix("quiz_")?.strip_suffix("_grades")?;
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("Quiz {number}"))
}

struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn parse(name: &str, csv_data: &str) -> Result<Self, GradebookError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(csv_data.as_bytes());

        let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn require(&self, column: &str) -> Result<usize, GradebookError> {
        self.position(column)
            .ok_or_else(|| GradebookError::MissingColumn {
                table: self.name.clone(),
                column: column.into(),
            })
    }

    fn number(
        &self,
        row: usize,
        record: &csv::StringRecord,
        idx: usize,
    ) -> Result<Option<f64>, GradebookError> {
        let value = record.get(idx).unwrap_or("").trim();
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| GradebookError::InvalidNumber {
                table: self.name.clone(),
                row,
                column: self.headers[idx].clone(),
                value: value.to_string(),
            })
    }
}

fn text(record: &csv::StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").trim().to_string()
}

pub fn parse_roster(csv_data: &str) -> Result<Vec<RosterRow>, GradebookError> {
    let table = Table::parse("roster", csv_data)?;
    let id_idx = table.require("NetID")?;
    let email_idx = table.require("Email Address")?;
    let section_idx = table.require("Section")?;

    Ok(table
        .rows
        .iter()
        .map(|record| RosterRow {
            identifier: normalize_key(&text(record, id_idx)),
            email: normalize_key(&text(record, email_idx)),
            section: text(record, section_idx),
        })
        .collect())
}

/// Pairs every `<Name>` column with its `<Name> - Max Points` column.
/// Submission timestamp columns are dropped.
pub fn parse_grades(csv_data: &str) -> Result<Vec<GradeRow>, GradebookError> {
    let table = Table::parse("grades", csv_data)?;
    let id_idx = table.require("SID")?;
    let first_idx = table.position("First Name");
    let last_idx = table.position("Last Name");

    let mut pairs: Vec<(String, usize, usize)> = Vec::new();
    for (idx, header) in table.headers.iter().enumerate() {
        if header.contains("Submission")
            || idx == id_idx
            || Some(idx) == first_idx
            || Some(idx) == last_idx
        {
            continue;
        }
        match header.strip_suffix(MAX_POINTS_SUFFIX) {
            Some(base) => {
                let earned_idx =
                    table
                        .position(base)
                        .ok_or_else(|| GradebookError::UnpairedColumn {
                            table: table.name.clone(),
                            column: header.clone(),
                        })?;
                pairs.push((base.to_string(), earned_idx, idx));
            }
            None => {
                let max_column = format!("{header}{MAX_POINTS_SUFFIX}");
                if table.position(&max_column).is_none() {
                    return Err(GradebookError::UnpairedColumn {
                        table: table.name.clone(),
                        column: header.clone(),
                    });
                }
            }
        }
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    for (i, record) in table.rows.iter().enumerate() {
        let row = i + 1;
        let mut assignments = BTreeMap::new();
        for (name, earned_idx, max_idx) in &pairs {
            let score = RawScore {
                earned: table.number(row, record, *earned_idx)?,
                possible: table.number(row, record, *max_idx)?,
            };
            assignments.insert(name.clone(), score);
        }
        rows.push(GradeRow {
            identifier: normalize_key(&text(record, id_idx)),
            first_name: first_idx.map(|idx| text(record, idx)).unwrap_or_default(),
            last_name: last_idx.map(|idx| text(record, idx)).unwrap_or_default(),
            assignments,
        });
    }

    Ok(rows)
}

pub fn parse_quiz(name: &str, csv_data: &str) -> Result<QuizTable, GradebookError> {
    let table = Table::parse(name, csv_data)?;
    let email_idx = table.require("Email")?;
    let grade_idx = table.require("Grade")?;

    let mut grades = BTreeMap::new();
    for (i, record) in table.rows.iter().enumerate() {
        let email = normalize_key(&text(record, email_idx));
        let earned = table.number(i + 1, record, grade_idx)?;
        if grades.insert(email.clone(), earned).is_some() {
            return Err(GradebookError::DuplicateIdentifier {
                table: table.name.clone(),
                identifier: email,
            });
        }
    }

    Ok(QuizTable {
        name: name.to_string(),
        grades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = "ID,Name,NetID,Email Address,Section\n\
        1234567,\"Lee, Avery\",AXL12345,Avery.Lee@University.edu,1\n\
        2345678,\"Patel, Kiara\",KXP23456,kiara.patel@university.edu,2\n";

    const GRADES: &str = "First Name,Last Name,SID,Homework 1,Homework 1 - Max Points,Homework 1 - Submission Time,Exam 1,Exam 1 - Max Points,Exam 1 - Submission Time\n\
        Avery,Lee,axl12345,55,80,2019-08-29 08:56:02-07:00,90,100,2019-09-05 09:00:00-07:00\n\
        Kiara,Patel,kxp23456,,80,,78,100,2019-09-05 09:00:00-07:00\n";

    #[test]
    fn roster_keys_are_lowercased() {
        let rows = parse_roster(ROSTER).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].identifier, "axl12345");
        assert_eq!(rows[0].email, "avery.lee@university.edu");
        assert_eq!(rows[0].section, "1");
    }

    #[test]
    fn roster_without_section_is_structural_error() {
        let err = parse_roster("NetID,Email Address\nabc,a@b.c\n").unwrap_err();
        assert_eq!(
            err,
            GradebookError::MissingColumn {
                table: "roster".into(),
                column: "Section".into(),
            }
        );
    }

    #[test]
    fn grades_pair_earned_with_max_points() {
        let rows = parse_grades(GRADES).unwrap();
        assert_eq!(rows.len(), 2);
        let avery = &rows[0];
        assert_eq!(avery.last_name, "Lee");
        assert_eq!(avery.assignments.len(), 2);
        assert_eq!(avery.assignments["Homework 1"], RawScore::new(55.0, 80.0));
        assert_eq!(avery.assignments["Exam 1"], RawScore::new(90.0, 100.0));
        assert!(!avery.assignments.keys().any(|k| k.contains("Submission")));

        let kiara = &rows[1];
        assert_eq!(kiara.assignments["Homework 1"].earned, None);
        assert_eq!(kiara.assignments["Homework 1"].possible, Some(80.0));
    }

    #[test]
    fn max_points_without_earned_column_is_error() {
        let err = parse_grades("SID,Exam 1 - Max Points\nabc,100\n").unwrap_err();
        assert!(matches!(err, GradebookError::UnpairedColumn { column, .. } if column == "Exam 1 - Max Points"));
    }

    #[test]
    fn earned_without_max_points_is_error() {
        let err = parse_grades("SID,Exam 1\nabc,100\n").unwrap_err();
        assert!(matches!(err, GradebookError::UnpairedColumn { column, .. } if column == "Exam 1"));
    }

    #[test]
    fn non_numeric_score_reports_row_and_column() {
        let err = parse_grades("SID,Exam 1,Exam 1 - Max Points\nabc,ninety,100\n").unwrap_err();
        assert_eq!(
            err,
            GradebookError::InvalidNumber {
                table: "grades".into(),
                row: 1,
                column: "Exam 1".into(),
                value: "ninety".into(),
            }
        );
    }

    #[test]
    fn quiz_names_come_from_file_stem() {
        assert_eq!(quiz_name_from_stem("quiz_1_grades").as_deref(), Some("Quiz 1"));
        assert_eq!(quiz_name_from_stem("quiz_12_grades").as_deref(), Some("Quiz 12"));
        assert_eq!(quiz_name_from_stem("quiz_grades"), None);
        assert_eq!(quiz_name_from_stem("roster"), None);
    }

    #[test]
    fn quiz_requires_email_and_grade() {
        let quiz = parse_quiz("Quiz 1", "Last Name,First Name,Email,Grade\nLee,Avery,AVERY.LEE@university.edu,10\n")
            .unwrap();
        assert_eq!(quiz.grades["avery.lee@university.edu"], Some(10.0));

        let err = parse_quiz("Quiz 2", "Email\na@b.c\n").unwrap_err();
        assert!(matches!(err, GradebookError::MissingColumn { column, .. } if column == "Grade"));
    }

    #[test]
    fn loads_a_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ROSTER_FILE), ROSTER).unwrap();
        std::fs::write(dir.path().join(GRADES_FILE), GRADES).unwrap();
        std::fs::write(
            dir.path().join("quiz_2_grades.csv"),
            "Email,Grade\navery.lee@university.edu,12\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("quiz_1_grades.csv"),
            "Email,Grade\nkiara.patel@university.edu,9\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.csv"), "anything\n").unwrap();

        let input = load_data_dir(dir.path()).unwrap();
        assert_eq!(input.roster.len(), 2);
        assert_eq!(input.grades.len(), 2);
        let names: Vec<&str> = input.quizzes.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["Quiz 1", "Quiz 2"]);
    }

    #[test]
    fn missing_roster_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_data_dir(dir.path()).unwrap_err();
        assert!(matches!(err, GradebookError::Io(msg) if msg.contains(ROSTER_FILE)));
    }
}
