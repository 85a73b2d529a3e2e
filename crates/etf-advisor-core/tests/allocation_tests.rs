use etf_advisor_core::allocation::{recommend, ClientProfile, RecommendInput};
use etf_advisor_core::profile::{bucket_weights, BucketWeights, RiskTolerance, TimeHorizon};
use etf_advisor_core::scoring::{EtfRecord, HistoricalReturns, RiskMetrics, ScoredEtf, ScoredUniverse};
use etf_advisor_core::types::RiskGroup;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Portfolio allocation: bucket weights × ranked universe → positions
// ===========================================================================

fn scored_etf(
    isin: &str,
    group: RiskGroup,
    rank: u32,
    predicted: Option<Decimal>,
) -> ScoredEtf {
    ScoredEtf {
        group,
        predicted_annual_return: predicted,
        score: Some(dec!(5.0)),
        rank,
        record: EtfRecord {
            isin: isin.into(),
            name: format!("Fund {isin}"),
            category: "Core".into(),
            group,
            price: dec!(100),
            cost: dec!(0.20),
            aum: dec!(1000),
            returns: HistoricalReturns::default(),
            risk: RiskMetrics::default(),
        },
    }
}

fn universe(etfs: Vec<ScoredEtf>) -> ScoredUniverse {
    let scored = etfs.iter().filter(|e| e.score.is_some()).count();
    let unscored = etfs.len() - scored;
    ScoredUniverse {
        etfs,
        scored,
        unscored,
    }
}

fn full_universe() -> ScoredUniverse {
    universe(vec![
        scored_etf("IE00B4L5Y900", RiskGroup::Conservative, 1, Some(dec!(3))),
        scored_etf("IE00B4L5Y901", RiskGroup::Conservative, 2, Some(dec!(2))),
        scored_etf("IE00B4L5Y902", RiskGroup::Conservative, 3, Some(dec!(1))),
        scored_etf("IE00B4L5Y903", RiskGroup::Balanced, 1, Some(dec!(8))),
        scored_etf("IE00B4L5Y904", RiskGroup::Balanced, 2, Some(dec!(7))),
        scored_etf("IE00B4L5Y905", RiskGroup::Balanced, 3, Some(dec!(6))),
        scored_etf("IE00B4L5Y906", RiskGroup::Alternative, 1, Some(dec!(12))),
        scored_etf("IE00B4L5Y907", RiskGroup::Alternative, 2, Some(dec!(10))),
    ])
}

fn client(id: &str, weights: BucketWeights) -> ClientProfile {
    ClientProfile {
        client_id: id.into(),
        weights,
        age: None,
        annual_income: None,
    }
}

// ---------------------------------------------------------------------------
// Selection counts and weight splits
// ---------------------------------------------------------------------------

#[test]
fn test_bucket_weight_drives_selection_count() {
    // Medium/Medium → [0.40, 0.50, 0.10]: 2 + 2 + 1 positions
    let w = bucket_weights(RiskTolerance::Medium, TimeHorizon::Medium);
    let out = recommend(&RecommendInput {
        clients: vec![client("C1", w)],
        universe: full_universe(),
    })
    .unwrap()
    .result;

    let conservative = out
        .allocations
        .iter()
        .filter(|a| a.group == RiskGroup::Conservative)
        .count();
    let balanced = out
        .allocations
        .iter()
        .filter(|a| a.group == RiskGroup::Balanced)
        .count();
    let alternative = out
        .allocations
        .iter()
        .filter(|a| a.group == RiskGroup::Alternative)
        .count();
    assert_eq!((conservative, balanced, alternative), (2, 2, 1));
}

#[test]
fn test_three_way_split_above_half_weight() {
    // Low/Medium → conservative 0.60 > 0.50 → 3 ETFs at 0.20 each
    let w = bucket_weights(RiskTolerance::Low, TimeHorizon::Medium);
    let out = recommend(&RecommendInput {
        clients: vec![client("C1", w)],
        universe: full_universe(),
    })
    .unwrap()
    .result;

    let conservative: Vec<_> = out
        .allocations
        .iter()
        .filter(|a| a.group == RiskGroup::Conservative)
        .collect();
    assert_eq!(conservative.len(), 3);
    for a in conservative {
        assert_eq!(a.assigned_weight, dec!(0.20));
    }
}

#[test]
fn test_best_ranked_etfs_are_selected_first() {
    let w = bucket_weights(RiskTolerance::Medium, TimeHorizon::Medium);
    let out = recommend(&RecommendInput {
        clients: vec![client("C1", w)],
        universe: full_universe(),
    })
    .unwrap()
    .result;

    let balanced: Vec<_> = out
        .allocations
        .iter()
        .filter(|a| a.group == RiskGroup::Balanced)
        .collect();
    assert_eq!(balanced[0].group_rank, 1);
    assert_eq!(balanced[1].group_rank, 2);
}

#[test]
fn test_uneven_split_rounds_to_four_decimals() {
    // Alternative bucket 0.10 over 1 ETF stays 0.1000; push it over 3:
    // 0.55 / 3 = 0.1833 (4 dp, half-up)
    let out = recommend(&RecommendInput {
        clients: vec![client(
            "C1",
            BucketWeights {
                conservative: dec!(0.20),
                balanced: dec!(0.25),
                alternative: dec!(0.55),
            },
        )],
        universe: universe(vec![
            scored_etf("IE00B4L5Y900", RiskGroup::Conservative, 1, Some(dec!(3))),
            scored_etf("IE00B4L5Y903", RiskGroup::Balanced, 1, Some(dec!(8))),
            scored_etf("IE00B4L5Y906", RiskGroup::Alternative, 1, Some(dec!(12))),
            scored_etf("IE00B4L5Y907", RiskGroup::Alternative, 2, Some(dec!(10))),
            scored_etf("IE00B4L5Y908", RiskGroup::Alternative, 3, Some(dec!(9))),
        ]),
    })
    .unwrap()
    .result;

    let alternative: Vec<_> = out
        .allocations
        .iter()
        .filter(|a| a.group == RiskGroup::Alternative)
        .collect();
    assert_eq!(alternative.len(), 3);
    for a in alternative {
        assert_eq!(a.assigned_weight, dec!(0.1833));
    }
}

// ---------------------------------------------------------------------------
// Committed weight and expected return roll-up
// ---------------------------------------------------------------------------

#[test]
fn test_committed_weight_matches_bucket_weights_within_rounding() {
    for tol in [RiskTolerance::Low, RiskTolerance::Medium, RiskTolerance::High] {
        for hor in [TimeHorizon::Short, TimeHorizon::Medium, TimeHorizon::Long] {
            let w = bucket_weights(tol, hor);
            let out = recommend(&RecommendInput {
                clients: vec![client("C1", w)],
                universe: full_universe(),
            })
            .unwrap()
            .result;

            let total: Decimal = out
                .allocations
                .iter()
                .map(|a| a.assigned_weight)
                .sum();
            assert!(
                (total - w.sum()).abs() <= dec!(0.0003),
                "{tol:?}/{hor:?}: committed {total} vs {}",
                w.sum()
            );
            assert_eq!(out.clients[0].committed_weight, total);
        }
    }
}

#[test]
fn test_expected_return_is_weighted_sum_of_contributions() {
    // 0.40 split over ranks 1–2 conservative (3%, 2%), 0.50 over ranks 1–2
    // balanced (8%, 7%), 0.10 on rank-1 alternative (12%).
    // 0.20×3 + 0.20×2 + 0.25×8 + 0.25×7 + 0.10×12 = 5.95
    let w = bucket_weights(RiskTolerance::Medium, TimeHorizon::Medium);
    let out = recommend(&RecommendInput {
        clients: vec![client("C1", w)],
        universe: full_universe(),
    })
    .unwrap()
    .result;

    assert_eq!(out.clients[0].expected_annual_return, dec!(5.95));
}

#[test]
fn test_missing_predicted_return_contributes_nothing() {
    let out = recommend(&RecommendInput {
        clients: vec![client(
            "C1",
            BucketWeights {
                conservative: dec!(0.20),
                balanced: dec!(0.60),
                alternative: dec!(0.20),
            },
        )],
        universe: universe(vec![
            scored_etf("IE00B4L5Y900", RiskGroup::Conservative, 1, None),
            scored_etf("IE00B4L5Y903", RiskGroup::Balanced, 1, Some(dec!(10))),
            scored_etf("IE00B4L5Y906", RiskGroup::Alternative, 1, Some(dec!(5))),
        ]),
    })
    .unwrap()
    .result;

    // 0.60×10 + 0.20×5 = 7.00, conservative row contributes nothing
    assert_eq!(out.clients[0].expected_annual_return, dec!(7.00));
    let conservative_row = out
        .allocations
        .iter()
        .find(|a| a.group == RiskGroup::Conservative)
        .unwrap();
    assert_eq!(conservative_row.return_contribution, None);
}

// ---------------------------------------------------------------------------
// Degenerate buckets
// ---------------------------------------------------------------------------

#[test]
fn test_empty_bucket_is_silently_skipped_and_weight_dropped() {
    let w = bucket_weights(RiskTolerance::Medium, TimeHorizon::Medium);
    let out = recommend(&RecommendInput {
        clients: vec![client("C1", w)],
        universe: universe(vec![
            scored_etf("IE00B4L5Y900", RiskGroup::Conservative, 1, Some(dec!(3))),
            scored_etf("IE00B4L5Y903", RiskGroup::Balanced, 1, Some(dec!(8))),
            // no alternative candidates at all
        ]),
    })
    .unwrap();

    assert!(out
        .warnings
        .iter()
        .any(|msg| msg.contains("Alt") && msg.contains("no candidates")));
    let result = out.result;
    assert!(result
        .allocations
        .iter()
        .all(|a| a.group != RiskGroup::Alternative));
    // committed weight excludes the 0.10 alternative bucket
    assert_eq!(result.clients[0].committed_weight, dec!(0.90));
}

#[test]
fn test_shallow_bucket_takes_fewer_etfs() {
    // Conservative 0.60 wants 3 ETFs but only 1 exists
    let out = recommend(&RecommendInput {
        clients: vec![client(
            "C1",
            BucketWeights {
                conservative: dec!(0.60),
                balanced: dec!(0.30),
                alternative: dec!(0.10),
            },
        )],
        universe: universe(vec![
            scored_etf("IE00B4L5Y900", RiskGroup::Conservative, 1, Some(dec!(3))),
            scored_etf("IE00B4L5Y903", RiskGroup::Balanced, 1, Some(dec!(8))),
            scored_etf("IE00B4L5Y904", RiskGroup::Balanced, 2, Some(dec!(7))),
            scored_etf("IE00B4L5Y906", RiskGroup::Alternative, 1, Some(dec!(12))),
        ]),
    })
    .unwrap()
    .result;

    let conservative: Vec<_> = out
        .allocations
        .iter()
        .filter(|a| a.group == RiskGroup::Conservative)
        .collect();
    assert_eq!(conservative.len(), 1);
    assert_eq!(conservative[0].assigned_weight, dec!(0.60));
}

#[test]
fn test_batch_clients_are_independent_rows() {
    let low = bucket_weights(RiskTolerance::Low, TimeHorizon::Medium);
    let high = bucket_weights(RiskTolerance::High, TimeHorizon::Medium);
    let out = recommend(&RecommendInput {
        clients: vec![client("C1", low), client("C2", high)],
        universe: full_universe(),
    })
    .unwrap()
    .result;

    assert_eq!(out.clients.len(), 2);
    let single = recommend(&RecommendInput {
        clients: vec![client("C2", high)],
        universe: full_universe(),
    })
    .unwrap()
    .result;
    assert_eq!(
        out.clients[1].expected_annual_return,
        single.clients[0].expected_annual_return
    );
}

#[test]
fn test_no_clients_is_an_error() {
    assert!(recommend(&RecommendInput {
        clients: vec![],
        universe: full_universe(),
    })
    .is_err());
}
