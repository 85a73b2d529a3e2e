use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::AdvisorError;
use crate::profile::BucketWeights;
use crate::scoring::ScoredUniverse;
use crate::types::{with_metadata, ComputationOutput, Percent, RiskGroup, Weight};
use crate::weights::{round2, round4};
use crate::AdvisorResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One client to build a portfolio for. Demographics are carried through to
/// the output untouched; only the bucket weights drive the allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    pub client_id: String,
    pub weights: BucketWeights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendInput {
    pub clients: Vec<ClientProfile>,
    pub universe: ScoredUniverse,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One row per (client, selected ETF).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub client_id: String,
    pub etf_name: String,
    pub etf_isin: String,
    pub group: RiskGroup,
    pub group_rank: u32,
    /// Fraction of the client's total portfolio, 4 decimals.
    pub assigned_weight: Weight,
    /// The ETF's extrapolated annual return, percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_annual_return: Option<Percent>,
    /// `assigned_weight × predicted_annual_return`, percent points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_contribution: Option<Percent>,
}

/// Per-client roll-up across all allocation rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientPortfolio {
    pub client_id: String,
    /// Weighted sum of selected ETFs' predicted returns, percent, 2 decimals.
    /// Feeds the projection engine as its single annual rate.
    pub expected_annual_return: Percent,
    /// Sum of assigned weights. Below 1.00 when a bucket had no candidates.
    pub committed_weight: Weight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendOutput {
    pub allocations: Vec<Allocation>,
    pub clients: Vec<ClientPortfolio>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// How many ETFs a bucket deploys, by bucket weight.
fn selection_count(weight: Weight) -> usize {
    if weight > dec!(0.50) {
        3
    } else if weight >= dec!(0.30) {
        2
    } else {
        1
    }
}

/// Map each client's bucket weights onto the ranked universe.
///
/// Per bucket: pick the best-ranked candidates (input order breaks rank
/// ties), split the bucket weight evenly across them at 4 decimals, and roll
/// the weighted predicted returns up into the client's expected annual
/// return. A bucket with zero candidates deploys nothing; its weight is
/// dropped from the committed total and reported as a warning.
pub fn recommend(input: &RecommendInput) -> AdvisorResult<ComputationOutput<RecommendOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.clients.is_empty() {
        return Err(AdvisorError::InsufficientData(
            "Recommendation requires at least one client".into(),
        ));
    }
    if input.universe.etfs.is_empty() {
        return Err(AdvisorError::InsufficientData(
            "Recommendation requires a non-empty scored universe".into(),
        ));
    }

    for group in RiskGroup::ALL {
        if input.universe.group_ranked(group).is_empty() {
            warnings.push(format!(
                "Risk group {} has no candidates; its bucket weight will not be deployed",
                group.short_label()
            ));
        }
    }

    let mut allocations: Vec<Allocation> = Vec::new();
    let mut clients: Vec<ClientPortfolio> = Vec::new();

    for client in &input.clients {
        let weight_sum = client.weights.sum();
        if weight_sum != dec!(1.00) {
            warnings.push(format!(
                "Client {} has bucket weights summing to {weight_sum}, not 1.00",
                client.client_id
            ));
        }

        let mut expected_return = Decimal::ZERO;
        let mut committed = Decimal::ZERO;

        for group in RiskGroup::ALL {
            let candidates = input.universe.group_ranked(group);
            if candidates.is_empty() {
                continue;
            }

            let bucket_weight = client.weights.get(group);
            let take = selection_count(bucket_weight).min(candidates.len());
            let per_etf = round4(bucket_weight / Decimal::from(take as u64));

            for etf in &candidates[..take] {
                let contribution = etf
                    .predicted_annual_return
                    .map(|r| per_etf * r);
                if let Some(c) = contribution {
                    expected_return += c;
                }
                committed += per_etf;

                allocations.push(Allocation {
                    client_id: client.client_id.clone(),
                    etf_name: etf.record.name.clone(),
                    etf_isin: etf.record.isin.clone(),
                    group,
                    group_rank: etf.rank,
                    assigned_weight: per_etf,
                    predicted_annual_return: etf.predicted_annual_return,
                    return_contribution: contribution,
                });
            }
        }

        clients.push(ClientPortfolio {
            client_id: client.client_id.clone(),
            expected_annual_return: round2(expected_return),
            committed_weight: committed,
        });
    }

    let output = RecommendOutput {
        allocations,
        clients,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "selection_rule": "weight > 0.50 → 3 ETFs, 0.30–0.50 → 2, < 0.30 → 1",
        "split": "bucket weight divided evenly, 4-decimal rounding",
        "degenerate_bucket": "weight dropped, not redistributed",
    });

    Ok(with_metadata(
        "Rank-driven bucket allocation with even weight split",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}
