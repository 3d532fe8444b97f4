use crate::models::{Action, FeatureVector, TransactionRecord};

pub const RATIO_EPSILON: f64 = 1e-6;

const SECONDS_PER_DAY: f64 = 86_400.0;

const STABLECOINS: [&str; 3] = ["USDC", "USDT", "DAI"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletAccumulator {
    pub wallet: String,
    pub deposit_count: u64,
    pub borrow_count: u64,
    pub repay_count: u64,
    pub redeem_count: u64,
    pub liquidation_count: u64,
    pub deposit_usd: f64,
    pub borrow_usd: f64,
    pub repay_usd: f64,
    pub liquidation_usd: f64,
    pub tx_count: u64,
    pub first_ts: Option<i64>,
    pub last_ts: Option<i64>,
}

impl WalletAccumulator {
    pub fn new(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            ..Self::default()
        }
    }

    pub fn update(&mut self, record: &TransactionRecord) {
        let data = &record.action_data;
        let usd = usd_value(data.amount_value(), data.price_value(), &data.asset_symbol);

        self.tx_count += 1;
        if let Some(ts) = record.timestamp {
            self.first_ts = Some(self.first_ts.map_or(ts, |first| first.min(ts)));
            self.last_ts = Some(self.last_ts.map_or(ts, |last| last.max(ts)));
        }

        match record.action() {
            Action::Deposit => {
                self.deposit_count += 1;
                self.deposit_usd += usd;
            }
            Action::Borrow => {
                self.borrow_count += 1;
                self.borrow_usd += usd;
            }
            Action::Repay => {
                self.repay_count += 1;
                self.repay_usd += usd;
            }
            // redemptions are counted but their value is not summed
            Action::RedeemUnderlying => self.redeem_count += 1,
            Action::LiquidationCall => {
                self.liquidation_count += 1;
                self.liquidation_usd += usd;
            }
            Action::Other => {}
        }
    }

    /// Days between the first and last timestamp, or zero when the wallet
    /// has no timestamped activity.
    pub fn active_days(&self) -> f64 {
        match (self.first_ts, self.last_ts) {
            // float difference so saturated timestamps cannot overflow
            (Some(first), Some(last)) => (last as f64 - first as f64) / SECONDS_PER_DAY,
            _ => 0.0,
        }
    }

    pub fn features(&self) -> FeatureVector {
        derive(self)
    }
}

/// A zero-day window keeps the raw transaction count as `tx_per_day`.
pub fn derive(acc: &WalletAccumulator) -> FeatureVector {
    let active_days = acc.active_days();
    let tx_per_day = if active_days != 0.0 {
        acc.tx_count as f64 / (active_days + 1.0)
    } else {
        acc.tx_count as f64
    };

    FeatureVector {
        deposit_usd: acc.deposit_usd,
        borrow_repaid_ratio: acc.repay_usd / (acc.borrow_usd + RATIO_EPSILON),
        liquidation_borrow_ratio: acc.liquidation_count as f64
            / (acc.borrow_count as f64 + RATIO_EPSILON),
        tx_per_day,
        redeem_ratio: acc.redeem_count as f64 / (acc.deposit_count as f64 + RATIO_EPSILON),
        liquidation_count: acc.liquidation_count,
    }
}

/// Approximate USD value of a raw on-chain amount.
///
/// The log carries no token decimals, so the scale is guessed: stablecoins
/// use 6, amounts whose rendering is longer than ten characters use 18, and
/// anything else is assumed to be already human-scaled. This misjudges
/// 18-decimal tokens with small raw amounts and very large amounts that
/// render in scientific notation; scores depend on it, so it stays as is.
pub fn usd_value(amount: f64, price: f64, symbol: &str) -> f64 {
    let symbol = symbol.to_uppercase();
    let divisor = if STABLECOINS.contains(&symbol.as_str()) {
        1e6
    } else if decimal_repr_len(amount) > 10 {
        1e18
    } else {
        return amount * price;
    };
    amount * price / divisor
}

/// Length of the shortest round-trip decimal rendering of `value`.
///
/// Magnitudes with a decimal exponent in [-4, 16) render in fixed notation
/// with a trailing `.0` when integral (`5000000.0`, `0.00015`); the rest
/// render in scientific notation with a signed, two-digit-minimum exponent
/// (`1e+18`, `1.5e-05`).
pub fn decimal_repr_len(value: f64) -> usize {
    if value.is_nan() {
        return 3;
    }
    let sign = usize::from(value.is_sign_negative());
    if value.is_infinite() {
        return sign + 3;
    }

    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits = mantissa.chars().filter(char::is_ascii_digit).count();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let body = if (-4..16).contains(&exponent) {
        if exponent >= 0 {
            let int_digits = exponent as usize + 1;
            if digits <= int_digits {
                int_digits + 2
            } else {
                digits + 1
            }
        } else {
            2 + (-exponent - 1) as usize + digits
        }
    } else {
        let point = usize::from(digits > 1);
        let exp_digits = exponent.unsigned_abs().to_string().len().max(2);
        digits + point + 2 + exp_digits
    };
    sign + body
}
