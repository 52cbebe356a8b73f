//! FinScore: a composite financial-risk score for a company, computed
//! from 2–3 years of accounting statements.
//!
//! The pipeline is a pure function chain: ratio derivation → z-score
//! standardization → PCA → recency-weighted aggregation → scaling and
//! band classification → credit-policy recommendation. `report::run_scoring`
//! is the single entry point; the stage modules are public for callers
//! that need the intermediate structures.

pub mod aggregate;
pub mod error;
pub mod pca;
pub mod policy;
pub mod ratios;
pub mod report;
pub mod score;
pub mod standardize;
pub mod statements;
pub mod types;

pub use error::FinScoreError;
pub use types::*;

/// Standard result type for all finscore operations
pub type FinScoreResult<T> = Result<T, FinScoreError>;
