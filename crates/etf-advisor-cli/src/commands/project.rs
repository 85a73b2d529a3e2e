use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use etf_advisor_core::projection::{self, MonthlyRateConvention, ProjectionInput};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConventionArg {
    /// (1 + annual)^(1/12) − 1
    Geometric,
    /// annual / 12
    Simple,
}

impl From<ConventionArg> for MonthlyRateConvention {
    fn from(value: ConventionArg) -> Self {
        match value {
            ConventionArg::Geometric => MonthlyRateConvention::Geometric,
            ConventionArg::Simple => MonthlyRateConvention::Simple,
        }
    }
}

/// Arguments for compound-growth projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Lump sum invested at month zero
    #[arg(long)]
    pub initial: Option<String>,

    /// Contribution at the end of each month
    #[arg(long)]
    pub monthly: Option<String>,

    /// Expected annual return, percent (6 = 6%)
    #[arg(long)]
    pub rate: Option<String>,

    /// Projection horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Monthly volatility proxy for the uncertainty band (default 0.01)
    #[arg(long)]
    pub sigma_month: Option<String>,

    /// Annual-to-monthly rate conversion
    #[arg(long, value_enum)]
    pub convention: Option<ConventionArg>,

    /// Path to a YAML parameter file; flags override its fields
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    // Parameter files and piped JSON carry the annual rate as a fraction,
    // matching the engine. The --rate flag takes a percent.
    let (mut proj_input, from_source) = if let Some(path) = &args.config {
        (input::file::read_yaml::<ProjectionInput>(path)?, true)
    } else if let Some(data) = input::stdin::read_piped_json()? {
        (serde_json::from_value(data)?, true)
    } else {
        (
            ProjectionInput {
                initial_contribution: Decimal::ZERO,
                monthly_contribution: Decimal::ZERO,
                annual_rate: Decimal::ZERO,
                years: 0,
                sigma_month: None,
                convention: MonthlyRateConvention::default(),
            },
            false,
        )
    };

    if !from_source && (args.rate.is_none() || args.years.is_none()) {
        return Err("--rate and --years required without --config or piped input".into());
    }

    if let Some(v) = &args.initial {
        proj_input.initial_contribution = parse_decimal("initial", v)?;
    }
    if let Some(v) = &args.monthly {
        proj_input.monthly_contribution = parse_decimal("monthly", v)?;
    }
    if let Some(v) = &args.rate {
        proj_input.annual_rate = parse_decimal("rate", v)? / dec!(100);
    }
    if let Some(v) = args.years {
        proj_input.years = v;
    }
    if let Some(v) = &args.sigma_month {
        proj_input.sigma_month = Some(parse_decimal("sigma-month", v)?);
    }
    if let Some(v) = args.convention {
        proj_input.convention = v.into();
    }

    let output = projection::project(&proj_input)?;
    let result = output.result;

    let rows: Vec<Value> = result
        .points
        .iter()
        .map(|p| {
            json!({
                "Año": p.year,
                "Valor_Central": p.central,
                "Banda_Superior": p.upper,
                "Banda_Inferior": p.lower,
            })
        })
        .collect();

    Ok(json!({
        "rows": rows,
        "summary": {
            "Capital_Final": result.final_value,
            "Capital_Aportado": result.contributed_capital,
            "Ganancia_Estimada": result.estimated_gain,
            "Tasa_Mensual": result.monthly_rate,
        },
        "warnings": output.warnings,
        "methodology": output.methodology,
    }))
}

fn parse_decimal(flag: &str, value: &str) -> Result<Decimal, Box<dyn std::error::Error>> {
    value
        .parse::<Decimal>()
        .map_err(|_| format!("Invalid value for --{}: '{}'", flag, value).into())
}
