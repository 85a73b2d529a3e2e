mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::project::ProjectArgs;
use commands::recommend::RecommendArgs;
use commands::score::ScoreArgs;
use commands::weights::WeightsArgs;

/// Personalized ETF portfolio recommendation pipeline
#[derive(Parser)]
#[command(
    name = "etfa",
    version,
    about = "ETF scoring, risk-bucket allocation and growth projection",
    long_about = "Scores and ranks an ETF universe with group-relative composite \
                  metrics, derives per-client risk-bucket weights from a short \
                  questionnaire, maps them to concrete positions, and projects \
                  the portfolio's compound growth. All arithmetic is decimal-exact."
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
    /// Score and rank an ETF universe from a cleaned CSV
    Score(ScoreArgs),
    /// Derive risk-bucket weights from a risk profile or a client table
    Weights(WeightsArgs),
    /// Build per-client ETF allocations with expected portfolio returns
    Recommend(RecommendArgs),
    /// Project compound growth of a contribution plan
    Project(ProjectArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Score(args) => commands::score::run_score(args),
        Commands::Weights(args) => commands::weights::run_weights(args),
        Commands::Recommend(args) => commands::recommend::run_recommend(args),
        Commands::Project(args) => commands::project::run_project(args),
        Commands::Version => {
            println!("etfa {}", env!("CARGO_PKG_VERSION"));
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
