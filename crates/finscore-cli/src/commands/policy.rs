use clap::Args;
use serde_json::Value;

use finscore_core::policy::{self, PolicyInputs};

use crate::input;

/// Arguments for running the policy engine directly
#[derive(Args)]
pub struct PolicyArgs {
    /// Path to a PolicyInputs JSON file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_policy(args: PolicyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let policy_inputs: PolicyInputs = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file is required (or pipe JSON to stdin)".into());
    };

    let decision = policy::decide(&policy_inputs);
    Ok(serde_json::to_value(decision)?)
}
