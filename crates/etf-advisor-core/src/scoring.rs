use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::AdvisorError;
use crate::types::{with_metadata, ComputationOutput, Percent, RiskGroup};
use crate::weights::round2;
use crate::AdvisorResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Historical returns at the seven horizons published by the data provider,
/// each a percentage (10 = 10%). Any subset may be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalReturns {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_month: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub three_months: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub six_months: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_year: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub three_years: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub five_years: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ten_years: Option<Percent>,
}

/// KID/risk metrics from the provider's 3-year monthly series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpe: Option<Decimal>,
    /// Regulatory 1–7 risk indicator; lower is safer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid_sri: Option<u8>,
}

/// One cleaned instrument row. Immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtfRecord {
    pub isin: String,
    pub name: String,
    pub category: String,
    pub group: RiskGroup,
    pub price: Decimal,
    /// Expense ratio, percent
    pub cost: Decimal,
    /// Assets under management
    pub aum: Decimal,
    #[serde(default)]
    pub returns: HistoricalReturns,
    #[serde(default)]
    pub risk: RiskMetrics,
}

/// Where the scoring run takes each ETF's risk group from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSource {
    /// Use the group assigned by the ingestion stage (Grupo column).
    #[default]
    Record,
    /// Reclassify from 3-year monthly volatility terciles at scoring time.
    /// Records without a volatility reading keep their ingested group.
    VolatilityTerciles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreUniverseInput {
    pub etfs: Vec<EtfRecord>,
    #[serde(default)]
    pub group_source: GroupSource,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEtf {
    /// Group actually used for scoring (differs from `record.group` only
    /// under tercile reclassification).
    pub group: RiskGroup,
    /// Extrapolated annual return, percent. Absent when no historical
    /// horizon was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_annual_return: Option<Percent>,
    /// Composite score on the 0–10 scale, 2 decimals. Absent when the ETF
    /// had no usable metric at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Decimal>,
    /// Dense rank within `group`, 1 = best. ETFs without a score share the
    /// rank below all scored ones.
    pub rank: u32,
    pub record: EtfRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredUniverse {
    pub etfs: Vec<ScoredEtf>,
    pub scored: usize,
    pub unscored: usize,
}

impl ScoredUniverse {
    /// ETFs of one group ordered best rank first (input order breaks ties).
    pub fn group_ranked(&self, group: RiskGroup) -> Vec<&ScoredEtf> {
        let mut out: Vec<&ScoredEtf> = self.etfs.iter().filter(|e| e.group == group).collect();
        out.sort_by_key(|e| e.rank);
        out
    }
}

// ---------------------------------------------------------------------------
// Metric configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    Alpha,
    Sharpe,
    PredictedReturn,
    KidSri,
    Cost,
    OneYearReturn,
    Aum,
}

const METRICS: [Metric; 7] = [
    Metric::Alpha,
    Metric::Sharpe,
    Metric::PredictedReturn,
    Metric::KidSri,
    Metric::Cost,
    Metric::OneYearReturn,
    Metric::Aum,
];

impl Metric {
    /// Cost and the regulatory risk indicator are penalties; everything
    /// else rewards.
    fn lower_is_better(&self) -> bool {
        matches!(self, Metric::KidSri | Metric::Cost)
    }

    /// Per-group weights for the quality/risk factors; constant weights for
    /// the secondary factors. Conservative buckets penalize risk hardest,
    /// alternative buckets reward outperformance.
    fn weight(&self, group: RiskGroup) -> Decimal {
        match self {
            Metric::Alpha => match group {
                RiskGroup::Conservative => dec!(0.75),
                RiskGroup::Balanced => dec!(1.00),
                RiskGroup::Alternative => dec!(1.25),
            },
            Metric::Sharpe => match group {
                RiskGroup::Conservative => dec!(1.25),
                RiskGroup::Balanced => dec!(1.50),
                RiskGroup::Alternative => dec!(1.00),
            },
            Metric::PredictedReturn => match group {
                RiskGroup::Conservative => dec!(0.50),
                RiskGroup::Balanced => dec!(1.00),
                RiskGroup::Alternative => dec!(1.25),
            },
            Metric::KidSri => match group {
                RiskGroup::Conservative => dec!(1.50),
                RiskGroup::Balanced => dec!(0.50),
                RiskGroup::Alternative => dec!(0.75),
            },
            Metric::Cost => dec!(0.75),
            Metric::OneYearReturn => dec!(0.3),
            Metric::Aum => dec!(0.25),
        }
    }
}

// ---------------------------------------------------------------------------
// Predicted annual return
// ---------------------------------------------------------------------------

/// Annualization as an exact ratio so that e.g. a 30% three-year return
/// extrapolates to precisely 10% annual.
const HORIZON_CONFIG: [(Decimal, Decimal, Decimal); 7] = [
    // (annualization numerator, denominator, evidentiary weight)
    (dec!(12), dec!(1), dec!(0.2)), // 1 month
    (dec!(4), dec!(1), dec!(0.3)),  // 3 months
    (dec!(2), dec!(1), dec!(0.5)),  // 6 months
    (dec!(1), dec!(1), dec!(1.0)),  // 1 year
    (dec!(1), dec!(3), dec!(1.0)),  // 3 years
    (dec!(1), dec!(5), dec!(1.0)),  // 5 years
    (dec!(1), dec!(10), dec!(1.0)), // 10 years
];

/// Weighted-average extrapolation of an annual return from whichever
/// historical horizons are present. `None` when no horizon is available —
/// never zero.
pub fn predicted_annual_return(returns: &HistoricalReturns) -> Option<Percent> {
    let horizons = [
        returns.one_month,
        returns.three_months,
        returns.six_months,
        returns.one_year,
        returns.three_years,
        returns.five_years,
        returns.ten_years,
    ];

    let mut weighted_sum = Decimal::ZERO;
    let mut weight_sum = Decimal::ZERO;

    for (value, (num, den, weight)) in horizons.iter().zip(HORIZON_CONFIG.iter()) {
        if let Some(v) = value {
            weighted_sum += *v * *num / *den * *weight;
            weight_sum += *weight;
        }
    }

    if weight_sum.is_zero() {
        None
    } else {
        Some(weighted_sum / weight_sum)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Score and rank an ETF universe.
///
/// Pipeline: predicted-return extrapolation per ETF, group-relative min-max
/// composite scoring with group-dependent metric weights, one linear rescale
/// of the full score distribution to 0–10, then dense ranking per group.
pub fn score_universe(
    input: &ScoreUniverseInput,
) -> AdvisorResult<ComputationOutput<ScoredUniverse>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input, &mut warnings)?;

    // -- Predicted annual return ---------------------------------------------
    let predicted: Vec<Option<Percent>> = input
        .etfs
        .iter()
        .map(|etf| predicted_annual_return(&etf.returns))
        .collect();

    let without_prediction = predicted.iter().filter(|p| p.is_none()).count();
    if without_prediction > 0 {
        warnings.push(format!(
            "{without_prediction} ETF(s) have no historical return at any horizon; \
             their predicted return is absent and they are excluded from return-based metrics"
        ));
    }

    // -- Effective group per ETF ---------------------------------------------
    let groups = match input.group_source {
        GroupSource::Record => input.etfs.iter().map(|e| e.group).collect::<Vec<_>>(),
        GroupSource::VolatilityTerciles => reclassify_by_volatility(&input.etfs),
    };

    // -- Group-relative composite raw scores ----------------------------------
    let raw_scores = composite_raw_scores(&input.etfs, &groups, &predicted);

    // -- Rescale the full distribution to 0–10 --------------------------------
    let scores = rescale_to_ten(&raw_scores);

    // -- Dense rank within each group -----------------------------------------
    let ranks = dense_ranks(&groups, &scores);

    let scored = scores.iter().filter(|s| s.is_some()).count();
    let unscored = scores.len() - scored;
    if unscored > 0 {
        warnings.push(format!(
            "{unscored} ETF(s) have no usable metric and carry no score; they rank last in their group"
        ));
    }

    let etfs: Vec<ScoredEtf> = input
        .etfs
        .iter()
        .enumerate()
        .map(|(i, record)| ScoredEtf {
            group: groups[i],
            predicted_annual_return: predicted[i],
            score: scores[i],
            rank: ranks[i],
            record: record.clone(),
        })
        .collect();

    let output = ScoredUniverse {
        etfs,
        scored,
        unscored,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "score_range": "0-10",
        "normalization": "min-max within risk group, per metric",
        "group_weights": {
            "conservative": { "alpha": "0.75", "sharpe": "1.25", "predicted_return": "0.50", "kid_sri": "1.50" },
            "balanced": { "alpha": "1.00", "sharpe": "1.50", "predicted_return": "1.00", "kid_sri": "0.50" },
            "alternative": { "alpha": "1.25", "sharpe": "1.00", "predicted_return": "1.25", "kid_sri": "0.75" },
        },
        "secondary_weights": { "cost": "0.75", "one_year_return": "0.3", "aum": "0.25" },
        "group_source": input.group_source,
    });

    Ok(with_metadata(
        "Group-relative composite ETF scoring with dynamic metric weights",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &ScoreUniverseInput, warnings: &mut Vec<String>) -> AdvisorResult<()> {
    if input.etfs.is_empty() {
        return Err(AdvisorError::InsufficientData(
            "Scoring requires at least one ETF".into(),
        ));
    }

    for etf in &input.etfs {
        if etf.isin.trim().is_empty() {
            return Err(AdvisorError::InvalidInput {
                field: "isin".into(),
                reason: format!("ETF '{}' has an empty ISIN", etf.name),
            });
        }
        if !isin_is_well_formed(&etf.isin) {
            warnings.push(format!(
                "ISIN '{}' does not match the 12-character ISIN pattern",
                etf.isin
            ));
        }
        if let Some(sri) = etf.risk.kid_sri {
            if !(1..=7).contains(&sri) {
                return Err(AdvisorError::InvalidInput {
                    field: "kid_sri".into(),
                    reason: format!("ETF '{}' has KID SRI {sri}, outside 1–7", etf.isin),
                });
            }
        }
    }

    Ok(())
}

/// `^[A-Z]{2}[A-Z0-9]{10}$`
fn isin_is_well_formed(isin: &str) -> bool {
    let bytes = isin.as_bytes();
    bytes.len() == 12
        && bytes[..2].iter().all(|b| b.is_ascii_uppercase())
        && bytes[2..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// Composite scoring
// ---------------------------------------------------------------------------

fn metric_value(etf: &EtfRecord, predicted: Option<Percent>, metric: Metric) -> Option<Decimal> {
    match metric {
        Metric::Alpha => etf.risk.alpha,
        Metric::Sharpe => etf.risk.sharpe,
        Metric::PredictedReturn => predicted,
        Metric::KidSri => etf.risk.kid_sri.map(Decimal::from),
        Metric::Cost => Some(etf.cost),
        Metric::OneYearReturn => etf.returns.one_year,
        Metric::Aum => Some(etf.aum),
    }
}

/// Raw (pre-rescale) weighted scores. For each group and metric, min-max
/// normalize over the group's present values, flip lower-is-better metrics,
/// and accumulate value and weight only for ETFs that carry the metric.
fn composite_raw_scores(
    etfs: &[EtfRecord],
    groups: &[RiskGroup],
    predicted: &[Option<Percent>],
) -> Vec<Option<Decimal>> {
    let mut value_acc = vec![Decimal::ZERO; etfs.len()];
    let mut weight_acc = vec![Decimal::ZERO; etfs.len()];

    for group in RiskGroup::ALL {
        let members: Vec<usize> = (0..etfs.len()).filter(|&i| groups[i] == group).collect();
        if members.is_empty() {
            continue;
        }

        for metric in METRICS {
            let values: Vec<(usize, Decimal)> = members
                .iter()
                .filter_map(|&i| metric_value(&etfs[i], predicted[i], metric).map(|v| (i, v)))
                .collect();
            if values.is_empty() {
                continue;
            }

            let min = values.iter().map(|(_, v)| *v).min().unwrap_or_default();
            let max = values.iter().map(|(_, v)| *v).max().unwrap_or_default();
            let weight = metric.weight(group);

            for (i, v) in values {
                let mut norm = if min == max {
                    dec!(0.5)
                } else {
                    (v - min) / (max - min)
                };
                if metric.lower_is_better() {
                    norm = Decimal::ONE - norm;
                }
                value_acc[i] += norm * weight;
                weight_acc[i] += weight;
            }
        }
    }

    (0..etfs.len())
        .map(|i| {
            if weight_acc[i].is_zero() {
                None
            } else {
                Some(value_acc[i] / weight_acc[i])
            }
        })
        .collect()
}

/// Linear rescale of the whole cross-group score distribution to [0, 10],
/// rounded to 2 decimals. A degenerate distribution collapses to 5.0.
fn rescale_to_ten(raw: &[Option<Decimal>]) -> Vec<Option<Decimal>> {
    let present: Vec<Decimal> = raw.iter().flatten().copied().collect();
    if present.is_empty() {
        return raw.to_vec();
    }

    let min = present.iter().copied().min().unwrap_or_default();
    let max = present.iter().copied().max().unwrap_or_default();

    raw.iter()
        .map(|s| {
            s.map(|v| {
                if min == max {
                    dec!(5.0)
                } else {
                    round2((v - min) / (max - min) * dec!(10))
                }
            })
        })
        .collect()
}

/// Dense ranks per group, descending by score: ties share a rank, no gaps,
/// and score-less ETFs share the rank immediately below all scored ones.
fn dense_ranks(groups: &[RiskGroup], scores: &[Option<Decimal>]) -> Vec<u32> {
    let mut ranks = vec![0u32; scores.len()];

    for group in RiskGroup::ALL {
        let mut scored: Vec<(usize, Decimal)> = (0..scores.len())
            .filter(|&i| groups[i] == group)
            .filter_map(|i| scores[i].map(|s| (i, s)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let mut rank = 0u32;
        let mut prev: Option<Decimal> = None;
        for (i, score) in &scored {
            if prev != Some(*score) {
                rank += 1;
                prev = Some(*score);
            }
            ranks[*i] = rank;
        }

        let bottom = rank + 1;
        for i in (0..scores.len()).filter(|&i| groups[i] == group) {
            if scores[i].is_none() {
                ranks[i] = bottom;
            }
        }
    }

    ranks
}

// ---------------------------------------------------------------------------
// Volatility-tercile reclassification
// ---------------------------------------------------------------------------

/// Reassign groups from the 3-year monthly volatility distribution: lowest
/// tercile → Conservative, middle → Balanced, top → Alternative. ETFs
/// without a volatility reading keep their ingested group.
fn reclassify_by_volatility(etfs: &[EtfRecord]) -> Vec<RiskGroup> {
    let mut vols: Vec<Decimal> = etfs.iter().filter_map(|e| e.risk.volatility).collect();
    if vols.len() < 3 {
        return etfs.iter().map(|e| e.group).collect();
    }
    vols.sort();

    let q33 = nearest_rank(&vols, dec!(1), dec!(3));
    let q66 = nearest_rank(&vols, dec!(2), dec!(3));

    etfs.iter()
        .map(|e| match e.risk.volatility {
            Some(v) if v <= q33 => RiskGroup::Conservative,
            Some(v) if v <= q66 => RiskGroup::Balanced,
            Some(_) => RiskGroup::Alternative,
            None => e.group,
        })
        .collect()
}

/// Nearest-rank quantile at `num/den` over a sorted slice.
fn nearest_rank(sorted: &[Decimal], num: Decimal, den: Decimal) -> Decimal {
    let n = Decimal::from(sorted.len());
    let idx = (num * n / den).ceil().to_usize().unwrap_or(1);
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn etf(isin: &str, group: RiskGroup) -> EtfRecord {
        EtfRecord {
            isin: isin.into(),
            name: format!("Test {isin}"),
            category: "Test".into(),
            group,
            price: dec!(100),
            cost: dec!(0.20),
            aum: dec!(500),
            returns: HistoricalReturns::default(),
            risk: RiskMetrics::default(),
        }
    }

    #[test]
    fn predicted_return_weighted_average_of_annualized_horizons() {
        let returns = HistoricalReturns {
            one_year: Some(dec!(10)),
            three_years: Some(dec!(30)),
            ..Default::default()
        };
        // (10×1×1.0 + 30×(1/3)×1.0) / (1.0 + 1.0) = 10.0
        assert_eq!(predicted_annual_return(&returns), Some(dec!(10)));
    }

    #[test]
    fn predicted_return_absent_without_any_horizon() {
        assert_eq!(predicted_annual_return(&HistoricalReturns::default()), None);
    }

    #[test]
    fn short_horizons_annualize_with_evidentiary_discount() {
        let returns = HistoricalReturns {
            one_month: Some(dec!(1)),
            ..Default::default()
        };
        // 1% monthly annualizes to 12%, lone weight cancels out
        assert_eq!(predicted_annual_return(&returns), Some(dec!(12)));
    }

    #[test]
    fn malformed_isin_warns_but_scores() {
        let mut a = etf("IE00B4L5Y983", RiskGroup::Balanced);
        a.returns.one_year = Some(dec!(8));
        let mut b = etf("not-an-isin", RiskGroup::Balanced);
        b.returns.one_year = Some(dec!(4));

        let out = score_universe(&ScoreUniverseInput {
            etfs: vec![a, b],
            group_source: GroupSource::Record,
        })
        .unwrap();

        assert!(out.warnings.iter().any(|w| w.contains("not-an-isin")));
        assert_eq!(out.result.scored, 2);
    }

    #[test]
    fn kid_sri_out_of_band_is_rejected() {
        let mut a = etf("IE00B4L5Y983", RiskGroup::Balanced);
        a.risk.kid_sri = Some(9);
        let err = score_universe(&ScoreUniverseInput {
            etfs: vec![a],
            group_source: GroupSource::Record,
        });
        assert!(err.is_err());
    }

    #[test]
    fn volatility_terciles_reclassify_in_order() {
        let mut etfs = Vec::new();
        for (i, vol) in [dec!(2), dec!(5), dec!(11), dec!(3), dec!(9), dec!(20)]
            .iter()
            .enumerate()
        {
            let mut e = etf(&format!("IE00B4L5Y98{i}"), RiskGroup::Balanced);
            e.risk.volatility = Some(*vol);
            etfs.push(e);
        }
        let groups = reclassify_by_volatility(&etfs);
        assert_eq!(groups[0], RiskGroup::Conservative); // vol 2
        assert_eq!(groups[3], RiskGroup::Conservative); // vol 3
        assert_eq!(groups[1], RiskGroup::Balanced); // vol 5
        assert_eq!(groups[4], RiskGroup::Balanced); // vol 9
        assert_eq!(groups[2], RiskGroup::Alternative); // vol 11
        assert_eq!(groups[5], RiskGroup::Alternative); // vol 20
    }
}
