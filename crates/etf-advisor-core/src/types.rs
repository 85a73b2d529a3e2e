use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Percentages as reported by data providers (10 = 10%).
pub type Percent = Decimal;

/// Portfolio weights as fractions of total capital (0–1).
pub type Weight = Decimal;

/// The three asset-class partitions used both to classify ETFs and to
/// express a client's target allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskGroup {
    /// Fixed income (wire value 1, "RF")
    Conservative,
    /// Equities (wire value 2, "RV")
    Balanced,
    /// Commodities, real estate, other (wire value 3, "Alt")
    Alternative,
}

impl RiskGroup {
    pub const ALL: [RiskGroup; 3] = [
        RiskGroup::Conservative,
        RiskGroup::Balanced,
        RiskGroup::Alternative,
    ];

    /// Numeric group code used by the ingestion schema (Grupo column).
    pub fn from_code(code: u8) -> Result<Self, AdvisorError> {
        match code {
            1 => Ok(RiskGroup::Conservative),
            2 => Ok(RiskGroup::Balanced),
            3 => Ok(RiskGroup::Alternative),
            other => Err(AdvisorError::InvalidInput {
                field: "group".into(),
                reason: format!("Unknown risk group code {other} (expected 1, 2 or 3)"),
            }),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            RiskGroup::Conservative => 1,
            RiskGroup::Balanced => 2,
            RiskGroup::Alternative => 3,
        }
    }

    /// Short label used in the client-facing allocation table.
    pub fn short_label(&self) -> &'static str {
        match self {
            RiskGroup::Conservative => "RF",
            RiskGroup::Balanced => "RV",
            RiskGroup::Alternative => "Alt",
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
