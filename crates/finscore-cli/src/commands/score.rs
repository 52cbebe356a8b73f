use clap::Args;
use serde_json::Value;

use finscore_core::report::{self, ScoringInput};
use finscore_core::statements;

use crate::input;

/// Arguments for the full scoring pipeline
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to a ScoringInput JSON file (company, statements, bureau_score)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_score(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: Value = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input file is required (or pipe JSON to stdin)".into());
    };

    // Pre-validate the statement rows so a missing field is reported by
    // name and year rather than as a deserialization error.
    if let Some(rows) = raw.get("statements") {
        statements::parse_statements(rows)?;
    }
    let scoring_input: ScoringInput = serde_json::from_value(raw)?;

    let result = report::run_scoring(&scoring_input)?;
    Ok(serde_json::to_value(result)?)
}
