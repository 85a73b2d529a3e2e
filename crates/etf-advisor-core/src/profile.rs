use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;
use crate::types::{RiskGroup, Weight};
use crate::weights;
use crate::AdvisorResult;

/// Self-declared appetite for drawdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTolerance {
    #[serde(alias = "Baja")]
    Low,
    #[serde(alias = "Media")]
    Medium,
    #[serde(alias = "Alta")]
    High,
}

/// Intended investment horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeHorizon {
    #[serde(alias = "Corto")]
    Short,
    #[serde(alias = "Medio")]
    Medium,
    #[serde(alias = "Largo")]
    Long,
}

impl RiskTolerance {
    pub fn parse(value: &str) -> AdvisorResult<Self> {
        match value.trim() {
            "Low" | "Baja" => Ok(RiskTolerance::Low),
            "Medium" | "Media" => Ok(RiskTolerance::Medium),
            "High" | "Alta" => Ok(RiskTolerance::High),
            other => Err(AdvisorError::InvalidProfile {
                field: "risk_tolerance".into(),
                value: other.into(),
            }),
        }
    }
}

impl TimeHorizon {
    pub fn parse(value: &str) -> AdvisorResult<Self> {
        match value.trim() {
            "Short" | "Corto" => Ok(TimeHorizon::Short),
            "Medium" | "Medio" => Ok(TimeHorizon::Medium),
            "Long" | "Largo" => Ok(TimeHorizon::Long),
            other => Err(AdvisorError::InvalidProfile {
                field: "horizon".into(),
                value: other.into(),
            }),
        }
    }
}

/// A client's capital split across the three risk buckets. Always sums to
/// exactly 1.00 at 2-decimal precision once produced by [`bucket_weights`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketWeights {
    pub conservative: Weight,
    pub balanced: Weight,
    pub alternative: Weight,
}

impl BucketWeights {
    pub fn get(&self, group: RiskGroup) -> Weight {
        match group {
            RiskGroup::Conservative => self.conservative,
            RiskGroup::Balanced => self.balanced,
            RiskGroup::Alternative => self.alternative,
        }
    }

    pub fn sum(&self) -> Decimal {
        self.conservative + self.balanced + self.alternative
    }

    fn from_array(w: [Decimal; 3]) -> Self {
        BucketWeights {
            conservative: w[0],
            balanced: w[1],
            alternative: w[2],
        }
    }
}

/// Minimum allocation per bucket, enforced after the horizon adjustment.
/// The floors sum to 0.50, so exact normalization is always feasible.
const MIN_CONSERVATIVE: Decimal = dec!(0.20);
const MIN_BALANCED: Decimal = dec!(0.20);
const MIN_ALTERNATIVE: Decimal = dec!(0.10);

/// Raw (pre-normalization) bucket weights for a profile: base table by
/// tolerance, additive horizon adjustment, then element-wise floor clamp.
/// The clamp can push the sum away from 1.00; [`weights::normalize`]
/// restores exact summation afterwards.
pub fn raw_weights(tolerance: RiskTolerance, horizon: TimeHorizon) -> [Decimal; 3] {
    let mut w = match tolerance {
        RiskTolerance::Low => [dec!(0.60), dec!(0.30), dec!(0.10)],
        RiskTolerance::Medium => [dec!(0.40), dec!(0.50), dec!(0.10)],
        RiskTolerance::High => [dec!(0.20), dec!(0.55), dec!(0.25)],
    };

    match horizon {
        TimeHorizon::Short => {
            w[0] += dec!(0.10);
            w[1] -= dec!(0.05);
            w[2] -= dec!(0.05);
        }
        TimeHorizon::Long => {
            w[0] -= dec!(0.10);
            w[1] += dec!(0.05);
            w[2] += dec!(0.05);
        }
        TimeHorizon::Medium => {}
    }

    w[0] = w[0].max(MIN_CONSERVATIVE);
    w[1] = w[1].max(MIN_BALANCED);
    w[2] = w[2].max(MIN_ALTERNATIVE);

    w
}

/// Derive a client's normalized bucket weights from their risk profile.
/// Pure and idempotent with respect to the profile.
pub fn bucket_weights(tolerance: RiskTolerance, horizon: TimeHorizon) -> BucketWeights {
    BucketWeights::from_array(weights::normalize(&raw_weights(tolerance, horizon)))
}
