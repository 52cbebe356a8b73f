use clap::Args;
use serde_json::Value;

use finscore_core::ratios;
use finscore_core::statements;

use crate::input;

/// Arguments for ratio-table derivation
#[derive(Args)]
pub struct RatiosArgs {
    /// Path to a JSON file: either a bare array of statement rows or a
    /// ScoringInput object
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_ratios(args: RatiosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: Value = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input file is required (or pipe JSON to stdin)".into());
    };

    let rows = if raw.is_array() {
        raw
    } else {
        raw.get("statements")
            .cloned()
            .ok_or("expected an array of statement rows or an object with 'statements'")?
    };

    let parsed = statements::parse_statements(&rows)?;
    let sorted = statements::validate_and_sort(parsed)?;
    let table = ratios::derive_ratios(&sorted);
    Ok(serde_json::to_value(table)?)
}
