use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use finscore_core::score;

/// Arguments for band classification without running the pipeline
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ClassifyArgs {
    /// Adjusted FinScore in [0, 1000]
    #[arg(long)]
    pub score: Option<Decimal>,

    /// Bureau score in [0, 1000]
    #[arg(long)]
    pub bureau: Option<Decimal>,
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.score.is_none() && args.bureau.is_none() {
        return Err("provide --score and/or --bureau".into());
    }

    let mut out = serde_json::Map::new();
    if let Some(score_value) = args.score {
        let band = score::classify_finscore(score_value);
        out.insert(
            "finscore".into(),
            json!({
                "score": score_value.to_string(),
                "band": band.to_string(),
                "rank": band.rank(),
            }),
        );
    }
    if let Some(bureau_value) = args.bureau {
        let band = score::classify_bureau(bureau_value);
        out.insert(
            "bureau".into(),
            json!({
                "score": bureau_value.to_string(),
                "band": band.to_string(),
                "rank": band.rank(),
            }),
        );
    }
    Ok(Value::Object(out))
}
