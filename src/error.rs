//! Error types for kinematic feature extraction.
//!
//! Every failure is raised synchronously at the point of detection. Errors that
//! relate to a column or joint carry its name, since column-naming mismatches
//! are the most common integration problem.

use thiserror::Error;

/// Main error type for kinematic feature operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// Invalid configuration (axis mapping, step size, change indices).
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A column required by the operation is absent from the table.
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    /// A column does not follow the `{joint}_pos_{xyz}` / `{joint}_rot_{wxyz}` schema.
    #[error("Unexpected column: {column}")]
    UnexpectedColumn { column: String },

    /// The same column name appears twice.
    #[error("Duplicate column: {column}")]
    DuplicateColumn { column: String },

    /// A column's length differs from the table's row count.
    #[error("Length mismatch in column {column}: expected {expected} rows, got {actual}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A quaternion with zero norm cannot be normalized.
    #[error("Degenerate input: zero-norm quaternion for joint {joint} at row {row}")]
    DegenerateInput { joint: String, row: usize },

    /// Input validation errors not covered above.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for kinematic feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

impl FeatureError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a column-not-found error.
    #[must_use]
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Create an unexpected-column error.
    #[must_use]
    pub fn unexpected_column(column: impl Into<String>) -> Self {
        Self::UnexpectedColumn {
            column: column.into(),
        }
    }

    /// Create a duplicate-column error.
    #[must_use]
    pub fn duplicate_column(column: impl Into<String>) -> Self {
        Self::DuplicateColumn {
            column: column.into(),
        }
    }

    /// Create a length mismatch error.
    #[must_use]
    pub fn length_mismatch(column: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            column: column.into(),
            expected,
            actual,
        }
    }

    /// Create a degenerate-input error.
    #[must_use]
    pub fn degenerate_input(joint: impl Into<String>, row: usize) -> Self {
        Self::DegenerateInput {
            joint: joint.into(),
            row,
        }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Attach a joint name to a degenerate-input error raised without one.
    #[must_use]
    pub(crate) fn for_joint(self, joint: &str) -> Self {
        match self {
            Self::DegenerateInput { row, .. } => Self::degenerate_input(joint, row),
            other => other,
        }
    }
}
