use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One lending-protocol event as it appears in the transaction log.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, deserialize_with = "decode_text")]
    pub user_wallet: Option<String>,
    #[serde(default, deserialize_with = "decode_text")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "decode_timestamp")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "decode_action_data")]
    pub action_data: ActionData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    #[serde(default = "default_amount", deserialize_with = "decode_amount")]
    pub amount: String,
    #[serde(
        rename = "assetPriceUSD",
        default = "default_price",
        deserialize_with = "decode_price"
    )]
    pub asset_price_usd: String,
    #[serde(default, deserialize_with = "decode_symbol")]
    pub asset_symbol: String,
}

impl Default for ActionData {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            asset_price_usd: default_price(),
            asset_symbol: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deposit,
    Borrow,
    Repay,
    RedeemUnderlying,
    LiquidationCall,
    Other,
}

impl Action {
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "deposit" => Action::Deposit,
            "borrow" => Action::Borrow,
            "repay" => Action::Repay,
            "redeemunderlying" => Action::RedeemUnderlying,
            "liquidationcall" => Action::LiquidationCall,
            _ => Action::Other,
        }
    }
}

impl TransactionRecord {
    pub fn action(&self) -> Action {
        self.action.as_deref().map(Action::parse).unwrap_or(Action::Other)
    }

    /// Wallet identifier, or `None` when it is missing or empty.
    pub fn wallet(&self) -> Option<&str> {
        self.user_wallet.as_deref().filter(|wallet| !wallet.is_empty())
    }
}

impl ActionData {
    /// Raw amount in the asset's native units; unparsable text counts as zero.
    pub fn amount_value(&self) -> f64 {
        parse_or(&self.amount, 0.0, "amount")
    }

    /// USD price per unit; unparsable text counts as one.
    pub fn price_value(&self) -> f64 {
        parse_or(&self.asset_price_usd, 1.0, "assetPriceUSD")
    }
}

fn parse_or(text: &str, fallback: f64, field: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            tracing::debug!(field, value = text, fallback, "coercing unparsable numeric field");
            fallback
        }
    }
}

/// Features derived from one wallet's accumulated activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub deposit_usd: f64,
    pub borrow_repaid_ratio: f64,
    pub liquidation_borrow_ratio: f64,
    pub tx_per_day: f64,
    pub redeem_ratio: f64,
    pub liquidation_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
    pub wallet: String,
    pub credit_score: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub wallet_count: usize,
    pub min_score: u32,
    pub max_score: u32,
    pub mean_score: f64,
    pub median_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u32,
}

fn default_amount() -> String {
    "0".to_string()
}

fn default_price() -> String {
    "1".to_string()
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn decode_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

fn decode_amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decode_text(deserializer)?.unwrap_or_else(default_amount))
}

fn decode_price<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decode_text(deserializer)?.unwrap_or_else(default_price))
}

fn decode_symbol<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decode_text(deserializer)?.unwrap_or_default())
}

fn decode_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|seconds| seconds as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|seconds| seconds as i64))
        }
        _ => None,
    })
}

fn decode_action_data<'de, D>(deserializer: D) -> Result<ActionData, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ActionData>::deserialize(deserializer)?.unwrap_or_default())
}
