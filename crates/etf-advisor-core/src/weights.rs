use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Round to 2 decimal places, half-up. Decimal arithmetic throughout, so
/// 0.1 + 0.2 rounds as 0.30 and never drifts the way binary floats do.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to 4 decimal places, half-up. Used for per-position weights.
pub fn round4(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Rebalance a triple of risk-bucket weights so they sum to exactly 1.00 at
/// 2-decimal precision.
///
/// Each weight is rounded half-up to 2 decimals, then the entire residual
/// (`1.00 − sum`) is added to the largest rounded weight. Ties go to the
/// first occurrence in input order. Total for any finite input, and
/// idempotent: normalizing an already-normalized triple is a no-op.
///
/// Out-of-range inputs are accepted unvalidated; range enforcement is the
/// profile allocator's job.
pub fn normalize(weights: &[Decimal; 3]) -> [Decimal; 3] {
    let mut rounded = [
        round2(weights[0]),
        round2(weights[1]),
        round2(weights[2]),
    ];

    let sum: Decimal = rounded.iter().sum();
    let residual = round2(dec!(1.00) - sum);

    if !residual.is_zero() {
        let mut idx_max = 0;
        for (i, w) in rounded.iter().enumerate() {
            if *w > rounded[idx_max] {
                idx_max = i;
            }
        }
        rounded[idx_max] = round2(rounded[idx_max] + residual);
    }

    rounded
}

/// Normalize a batch of weight triples, one client row at a time. Rows never
/// interact.
pub fn normalize_batch(rows: &[[Decimal; 3]]) -> Vec<[Decimal; 3]> {
    rows.iter().map(normalize).collect()
}
