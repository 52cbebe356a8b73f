use thiserror::Error;

/// Why a ratio column cannot be standardized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateReason {
    /// The column holds the same value in every observed year.
    ZeroVariance,
    /// At least one cell is mathematically undefined (division by zero).
    UndefinedCells,
}

impl std::fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegenerateReason::ZeroVariance => write!(f, "zero variance across years"),
            DegenerateReason::UndefinedCells => write!(f, "contains undefined values"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FinScoreError {
    #[error("Missing required field '{field}' for fiscal year {year}")]
    MissingField { field: String, year: i32 },

    #[error("Column '{column}' cannot be standardized: {reason}")]
    DegenerateColumn {
        column: String,
        reason: DegenerateReason,
    },

    #[error("Insufficient fiscal years: found {found}, need at least 2")]
    InsufficientYears { found: usize },

    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FinScoreError {
    fn from(e: serde_json::Error) -> Self {
        FinScoreError::Serialization(e.to_string())
    }
}
