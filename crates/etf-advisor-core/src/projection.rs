use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::AdvisorError;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::weights::round2;
use crate::AdvisorResult;

/// Rates below this magnitude are treated as zero to keep the annuity
/// formula away from division by zero.
const ZERO_RATE_THRESHOLD: Decimal = dec!(0.000000000001);

/// Floor for the lower-band monthly rate; keeps `1 + r` strictly positive.
const MIN_MONTHLY_RATE: Decimal = dec!(-0.9999);

/// How the annual rate converts to a monthly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyRateConvention {
    /// `(1 + annual)^(1/12) − 1`. Compounds back to the annual rate exactly.
    #[default]
    Geometric,
    /// `annual / 12`. Overstates growth slightly; kept for parity with the
    /// headline figures some dashboards use.
    Simple,
}

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub initial_contribution: Decimal,
    pub monthly_contribution: Decimal,
    /// Expected annual return as a decimal fraction (0.06 = 6%).
    pub annual_rate: Rate,
    pub years: u32,
    /// Monthly volatility proxy for the ±2σ band. Defaults to 0.01.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigma_month: Option<Decimal>,
    #[serde(default)]
    pub convention: MonthlyRateConvention,
}

/// One point on the projected trajectory, with the uncertainty band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub year: u32,
    pub central: Decimal,
    pub upper: Decimal,
    pub lower: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub points: Vec<ProjectionPoint>,
    /// Central value at the final year.
    pub final_value: Decimal,
    /// Initial plus all monthly contributions, no growth.
    pub contributed_capital: Decimal,
    /// `final_value − contributed_capital`.
    pub estimated_gain: Decimal,
    /// The monthly rate actually used for the central trajectory.
    pub monthly_rate: Rate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Deterministic compound-growth projection of a contribution plan.
///
/// Future value after `n` months at monthly rate `r`:
/// `FV = P₀(1+r)^n + PMT·((1+r)^n − 1)/r`, degrading to the simple sum
/// `P₀ + PMT·n` when `r` is effectively zero. The ±2σ band recomputes the
/// same trajectory at `r ± 2·sigma_month`, clamping the lower rate at
/// −0.9999. Pure function of its inputs.
pub fn project(input: &ProjectionInput) -> AdvisorResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let sigma = input.sigma_month.unwrap_or(dec!(0.01));
    let monthly_rate = monthly_rate(input.annual_rate, input.convention);
    let upper_rate = monthly_rate + dec!(2) * sigma;
    let lower_rate = (monthly_rate - dec!(2) * sigma).max(MIN_MONTHLY_RATE);

    if input.years > 60 {
        warnings.push(format!(
            "Projection horizon of {} years exceeds the 60-year presentation bound",
            input.years
        ));
    }

    let mut points = Vec::with_capacity(input.years as usize + 1);
    for year in 0..=input.years {
        let months = year * 12;
        points.push(ProjectionPoint {
            year,
            central: round2(future_value(
                input.initial_contribution,
                input.monthly_contribution,
                monthly_rate,
                months,
            )),
            upper: round2(future_value(
                input.initial_contribution,
                input.monthly_contribution,
                upper_rate,
                months,
            )),
            lower: round2(future_value(
                input.initial_contribution,
                input.monthly_contribution,
                lower_rate,
                months,
            )),
        });
    }

    let final_value = points.last().map(|p| p.central).unwrap_or_default();
    let contributed_capital = input.initial_contribution
        + input.monthly_contribution * Decimal::from(input.years * 12);
    let output = ProjectionOutput {
        final_value,
        contributed_capital,
        estimated_gain: final_value - contributed_capital,
        monthly_rate,
        points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "monthly_rate_convention": input.convention,
        "band": "central rate ± 2 × sigma_month, lower rate clamped at -0.9999",
        "sigma_month": sigma.to_string(),
    });

    Ok(with_metadata(
        "Compound future value of initial and monthly contributions",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Convert an annual rate to a monthly one under the chosen convention.
pub fn monthly_rate(annual_rate: Rate, convention: MonthlyRateConvention) -> Rate {
    match convention {
        MonthlyRateConvention::Geometric => {
            (Decimal::ONE + annual_rate).powd(Decimal::ONE / dec!(12)) - Decimal::ONE
        }
        MonthlyRateConvention::Simple => annual_rate / dec!(12),
    }
}

/// Future value of an initial lump plus a level monthly contribution.
fn future_value(initial: Decimal, monthly: Decimal, rate: Rate, months: u32) -> Decimal {
    if rate.abs() < ZERO_RATE_THRESHOLD {
        return initial + monthly * Decimal::from(months);
    }

    // Saturate instead of panicking on absurd rate/horizon combinations.
    let growth = (Decimal::ONE + rate)
        .checked_powd(Decimal::from(months))
        .unwrap_or(Decimal::MAX);
    let lump = initial.saturating_mul(growth);
    let annuity = monthly.saturating_mul((growth - Decimal::ONE) / rate);
    lump.saturating_add(annuity)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &ProjectionInput) -> AdvisorResult<()> {
    if input.initial_contribution < Decimal::ZERO {
        return Err(AdvisorError::InvalidInput {
            field: "initial_contribution".into(),
            reason: "Must be non-negative".into(),
        });
    }
    if input.monthly_contribution < Decimal::ZERO {
        return Err(AdvisorError::InvalidInput {
            field: "monthly_contribution".into(),
            reason: "Must be non-negative".into(),
        });
    }
    if input.annual_rate <= dec!(-1) {
        return Err(AdvisorError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Must be greater than -100%".into(),
        });
    }
    if let Some(sigma) = input.sigma_month {
        if sigma < Decimal::ZERO {
            return Err(AdvisorError::InvalidInput {
                field: "sigma_month".into(),
                reason: "Must be non-negative".into(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometric_monthly_rate_compounds_back_to_annual() {
        let r = monthly_rate(dec!(0.06), MonthlyRateConvention::Geometric);
        let annual = (Decimal::ONE + r).powd(dec!(12)) - Decimal::ONE;
        assert!((annual - dec!(0.06)).abs() < dec!(0.0001), "got {annual}");
    }

    #[test]
    fn simple_convention_divides_by_twelve() {
        assert_eq!(
            monthly_rate(dec!(0.12), MonthlyRateConvention::Simple),
            dec!(0.01)
        );
    }

    #[test]
    fn zero_rate_future_value_is_the_plain_sum() {
        assert_eq!(
            future_value(dec!(1000), dec!(100), Decimal::ZERO, 24),
            dec!(3400)
        );
    }
}
