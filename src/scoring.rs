use crate::models::FeatureVector;

pub const MAX_SCORE: u32 = 1000;

pub const DEPOSIT_WEIGHT: f64 = 0.35;
pub const REPAYMENT_WEIGHT: f64 = 0.20;
pub const LIQUIDATION_WEIGHT: f64 = 0.15;
pub const ACTIVITY_WEIGHT: f64 = 0.10;
pub const REDEMPTION_WEIGHT: f64 = 0.20;

pub const DEPOSIT_TARGET_USD: f64 = 10_000.0;
pub const ACTIVITY_TARGET_PER_DAY: f64 = 10.0;

pub const BOT_TX_PER_DAY: f64 = 50.0;
pub const LIQUIDATION_LIMIT: u64 = 5;
pub const PENALTY_FACTOR: f64 = 0.7;

/// Weighted credit score in `0..=1000`, truncated rather than rounded.
pub fn score(features: &FeatureVector) -> u32 {
    let scale = MAX_SCORE as f64;
    let mut raw = DEPOSIT_WEIGHT * cap_at_one(features.deposit_usd / DEPOSIT_TARGET_USD) * scale
        + REPAYMENT_WEIGHT * cap_at_one(features.borrow_repaid_ratio) * scale
        + LIQUIDATION_WEIGHT * (1.0 - cap_at_one(features.liquidation_borrow_ratio)) * scale
        + ACTIVITY_WEIGHT * cap_at_one(features.tx_per_day / ACTIVITY_TARGET_PER_DAY) * scale
        + REDEMPTION_WEIGHT * cap_at_one(features.redeem_ratio) * scale;

    if is_penalized(features) {
        raw *= PENALTY_FACTOR;
    }

    // `as` truncates toward zero and saturates; NaN becomes 0
    (raw as i64).clamp(0, MAX_SCORE as i64) as u32
}

pub fn is_penalized(features: &FeatureVector) -> bool {
    features.tx_per_day > BOT_TX_PER_DAY || features.liquidation_count > LIQUIDATION_LIMIT
}

fn cap_at_one(value: f64) -> f64 {
    if 1.0 < value {
        1.0
    } else {
        value
    }
}
