mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::classify::ClassifyArgs;
use commands::policy::PolicyArgs;
use commands::ratios::RatiosArgs;
use commands::score::ScoreArgs;

/// Composite financial-risk scoring from fiscal-year statements
#[derive(Parser)]
#[command(
    name = "finscore",
    version,
    about = "Composite financial-risk scoring from fiscal-year statements",
    long_about = "Computes the 0-1000 FinScore for a company from 2-3 years of \
                  balance-sheet and income-statement data: ratio catalogue, \
                  z-score standardization, PCA, recency weighting, band \
                  classification, and a credit-policy recommendation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full scoring pipeline on a company's statements
    Score(ScoreArgs),
    /// Derive the ratio table only, without scoring
    Ratios(RatiosArgs),
    /// Classify an adjusted FinScore and/or bureau score into bands
    Classify(ClassifyArgs),
    /// Run the policy engine on precomputed scores
    Policy(PolicyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Score(args) => commands::score::run_score(args),
        Commands::Ratios(args) => commands::ratios::run_ratios(args),
        Commands::Classify(args) => commands::classify::run_classify(args),
        Commands::Policy(args) => commands::policy::run_policy(args),
        Commands::Version => {
            println!("finscore {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
