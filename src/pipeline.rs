use std::collections::HashMap;

use crate::accumulator::WalletAccumulator;
use crate::models::{ScoreRecord, TransactionRecord};
use crate::scoring;

/// Per-batch wallet mapping, kept in first-seen order.
#[derive(Debug, Default)]
pub struct WalletBook {
    wallets: Vec<WalletAccumulator>,
    index: HashMap<String, usize>,
    records_seen: usize,
    skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub scores: Vec<ScoreRecord>,
    pub records_seen: usize,
    pub skipped_records: usize,
    pub first_ts: Option<i64>,
    pub last_ts: Option<i64>,
}

impl WalletBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one record to its wallet's accumulator. Records without a
    /// wallet identifier are counted and dropped.
    pub fn ingest(&mut self, record: &TransactionRecord) {
        self.records_seen += 1;
        let Some(wallet) = record.wallet() else {
            self.skipped += 1;
            return;
        };

        let slot = match self.index.get(wallet) {
            Some(&slot) => slot,
            None => {
                self.wallets.push(WalletAccumulator::new(wallet));
                self.index.insert(wallet.to_string(), self.wallets.len() - 1);
                self.wallets.len() - 1
            }
        };
        self.wallets[slot].update(record);
    }

    #[cfg(test)]
    pub fn get(&self, wallet: &str) -> Option<&WalletAccumulator> {
        self.index.get(wallet).map(|&slot| &self.wallets[slot])
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn scores(&self) -> Vec<ScoreRecord> {
        self.wallets
            .iter()
            .map(|acc| {
                let credit_score = scoring::score(&acc.features());
                tracing::debug!(
                    wallet = %acc.wallet,
                    tx_count = acc.tx_count,
                    repay_count = acc.repay_count,
                    liquidation_usd = acc.liquidation_usd,
                    credit_score,
                    "scored wallet"
                );
                ScoreRecord {
                    wallet: acc.wallet.clone(),
                    credit_score,
                }
            })
            .collect()
    }

    pub fn finish(self) -> BatchOutcome {
        let first_ts = self.wallets.iter().filter_map(|acc| acc.first_ts).min();
        let last_ts = self.wallets.iter().filter_map(|acc| acc.last_ts).max();
        BatchOutcome {
            scores: self.scores(),
            records_seen: self.records_seen,
            skipped_records: self.skipped,
            first_ts,
            last_ts,
        }
    }
}

pub fn score_transactions<'a, I>(records: I) -> BatchOutcome
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut book = WalletBook::new();
    for record in records {
        book.ingest(record);
    }

    if book.skipped > 0 {
        tracing::warn!(skipped = book.skipped, "skipped records without a wallet identifier");
    }
    tracing::info!(wallets = book.len(), records = book.records_seen, "accumulated wallet activity");

    book.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_transactions;
    use std::path::Path;

    fn parse(text: &str) -> Vec<TransactionRecord> {
        parse_transactions(text, Path::new("test.json")).unwrap()
    }

    #[test]
    fn single_deposit_scenario() {
        let records = parse(
            r#"[{"userWallet":"0xA","action":"Deposit","timestamp":1000,
                 "actionData":{"amount":"5000000","assetPriceUSD":"1","assetSymbol":"USDC"}}]"#,
        );
        let mut book = WalletBook::new();
        records.iter().for_each(|record| book.ingest(record));

        let acc = book.get("0xA").unwrap();
        assert_eq!(acc.deposit_count, 1);
        assert_eq!(acc.deposit_usd, 5.0);
        assert_eq!(acc.features().tx_per_day, 1.0);

        let outcome = book.finish();
        assert_eq!(
            outcome.scores,
            vec![ScoreRecord {
                wallet: "0xA".to_string(),
                credit_score: 160,
            }]
        );
    }

    #[test]
    fn wallets_keep_first_seen_order() {
        let records = parse(
            r#"[{"userWallet":"0xC","action":"deposit","timestamp":1},
                {"userWallet":"0xA","action":"borrow","timestamp":2},
                {"userWallet":"0xC","action":"repay","timestamp":3},
                {"userWallet":"0xB","action":"deposit","timestamp":4},
                {"userWallet":"0xA","action":"repay","timestamp":5}]"#,
        );
        let outcome = score_transactions(&records);
        let wallets: Vec<&str> = outcome.scores.iter().map(|s| s.wallet.as_str()).collect();
        assert_eq!(wallets, ["0xC", "0xA", "0xB"]);
        assert_eq!(outcome.first_ts, Some(1));
        assert_eq!(outcome.last_ts, Some(5));
    }

    #[test]
    fn records_without_wallet_are_skipped() {
        let records = parse(
            r#"[{"action":"deposit","timestamp":1},
                {"userWallet":"","action":"deposit"},
                {"userWallet":null,"action":"deposit"},
                {"userWallet":"0xA","action":"deposit","timestamp":2}]"#,
        );
        let outcome = score_transactions(&records);
        assert_eq!(outcome.records_seen, 4);
        assert_eq!(outcome.skipped_records, 3);
        assert_eq!(outcome.scores.len(), 1);
    }

    #[test]
    fn category_counts_match_input() {
        let records = parse(
            r#"[{"userWallet":"0xA","action":"deposit"},
                {"userWallet":"0xB","action":"Deposit"},
                {"userWallet":"0xA","action":"DEPOSIT"},
                {"userWallet":"0xA","action":"liquidationCall"},
                {"userWallet":"0xA","action":"redeemUnderlying"},
                {"userWallet":"0xA","action":"flashloan"},
                {"userWallet":"0xB","action":"borrow"}]"#,
        );
        let mut book = WalletBook::new();
        records.iter().for_each(|record| book.ingest(record));

        let a = book.get("0xA").unwrap();
        assert_eq!((a.deposit_count, a.liquidation_count, a.redeem_count), (2, 1, 1));
        assert_eq!(a.tx_count, 5);
        let b = book.get("0xB").unwrap();
        assert_eq!((b.deposit_count, b.borrow_count, b.tx_count), (1, 1, 2));
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn same_log_yields_identical_table() {
        let text = r#"[{"userWallet":"0xB","action":"deposit","timestamp":10,"actionData":{"amount":"2500000000000000000","assetPriceUSD":"1800.5","assetSymbol":"WETH"}},
                {"userWallet":"0xA","action":"borrow","timestamp":20,"actionData":{"amount":"7000000","assetSymbol":"USDT"}},
                {"userWallet":"0xB","action":"redeemUnderlying","timestamp":200000},
                {"userWallet":"0xA","action":"repay","timestamp":90000,"actionData":{"amount":"3500000","assetSymbol":"USDT"}}]
                trailing"#;
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");

        for path in [&first, &second] {
            let outcome = score_transactions(&parse(text));
            crate::report::write_scores(path, &outcome.scores).unwrap();
        }

        let bytes = std::fs::read(&first).unwrap();
        assert_eq!(bytes, std::fs::read(&second).unwrap());
        assert!(String::from_utf8(bytes).unwrap().starts_with("wallet,credit_score\n0xB,"));
    }

    #[test]
    fn record_order_within_a_wallet_does_not_change_scores() {
        let forward = parse(
            r#"[{"userWallet":"0xA","action":"deposit","timestamp":100,"actionData":{"amount":"20","assetPriceUSD":"3"}},
                {"userWallet":"0xA","action":"borrow","timestamp":90000,"actionData":{"amount":"10"}},
                {"userWallet":"0xA","action":"repay","timestamp":400000,"actionData":{"amount":"4"}}]"#,
        );
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(score_transactions(&forward), score_transactions(&reversed));
    }
}
