use std::fmt;

/// Structural failures. Missing score cells are not errors; they are filled
/// with zero during the join.
#[derive(Debug, Clone, PartialEq)]
pub enum GradebookError {
    /// A required column is absent from an input table.
    MissingColumn { table: String, column: String },
    /// An earned-points column without its `- Max Points` partner, or the reverse.
    UnpairedColumn { table: String, column: String },
    /// The same identifier appears twice in one table after case folding.
    DuplicateIdentifier { table: String, identifier: String },
    /// A score cell holds text that is not a number.
    InvalidNumber {
        table: String,
        row: usize,
        column: String,
        value: String,
    },
    /// A quiz table has no entry in the quiz point schedule.
    UnknownQuiz(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error.
    ConfigValidation(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for GradebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { table, column } => {
                write!(f, "table '{table}': missing column '{column}'")
            }
            Self::UnpairedColumn { table, column } => {
                write!(f, "table '{table}': column '{column}' has no earned/max points partner")
            }
            Self::DuplicateIdentifier { table, identifier } => {
                write!(f, "table '{table}': identifier '{identifier}' appears more than once")
            }
            Self::InvalidNumber {
                table,
                row,
                column,
                value,
            } => write!(
                f,
                "table '{table}', row {row}, column '{column}': cannot parse number '{value}'"
            ),
            Self::UnknownQuiz(name) => {
                write!(f, "quiz '{name}' is not in the quiz point schedule")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for GradebookError {}

impl From<std::io::Error> for GradebookError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<csv::Error> for GradebookError {
    fn from(err: csv::Error) -> Self {
        Self::Io(err.to_string())
    }
}
