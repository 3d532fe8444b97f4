use std::path::Path;

use crate::error::{CreditScoreError, Result};
use crate::models::TransactionRecord;

/// Reads a transaction log that may have been cut off mid-write.
///
/// Everything after the last `]` is discarded before parsing, so a log whose
/// tail was truncated still yields the records up to its final complete array
/// boundary. A file without any `]` is rejected outright.
pub fn load_transactions(path: &Path) -> Result<Vec<TransactionRecord>> {
    let text = std::fs::read_to_string(path).map_err(|source| CreditScoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_transactions(&text, path)
}

pub fn parse_transactions(text: &str, path: &Path) -> Result<Vec<TransactionRecord>> {
    let repaired = repair_truncated(text).ok_or_else(|| CreditScoreError::MissingArrayBoundary {
        path: path.to_path_buf(),
    })?;

    let discarded = text.len() - repaired.len();
    if discarded > 0 {
        tracing::warn!(
            path = %path.display(),
            discarded_bytes = discarded,
            "dropped trailing bytes after the last closing bracket"
        );
    }

    let records: Vec<TransactionRecord> =
        serde_json::from_str(repaired).map_err(|source| CreditScoreError::MalformedJson {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(count = records.len(), "loaded transactions after patching");
    Ok(records)
}

/// Returns the prefix of `text` up to and including its last `]`.
pub fn repair_truncated(text: &str) -> Option<&str> {
    text.rfind(']').map(|index| &text[..=index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ONE_DEPOSIT: &str = r#"[{"userWallet":"0xA","action":"Deposit","timestamp":1000,"actionData":{"amount":"5000000","assetPriceUSD":"1","assetSymbol":"USDC"}}]"#;

    #[test]
    fn repair_cuts_after_last_bracket() {
        assert_eq!(repair_truncated("[1, [2]] trailing"), Some("[1, [2]]"));
        assert_eq!(repair_truncated("[]"), Some("[]"));
        assert_eq!(repair_truncated("{\"a\": 1}"), None);
    }

    #[test]
    fn trailing_garbage_is_ignored() {
        let text = format!("{ONE_DEPOSIT}\n, {{\"userWallet\": \"0xB\", \"act");
        let records = parse_transactions(&text, Path::new("log.json")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].wallet(), Some("0xA"));
    }

    #[test]
    fn missing_bracket_is_fatal() {
        let err = parse_transactions("[{\"userWallet\": \"0xA\"", Path::new("log.json"))
            .unwrap_err();
        assert!(matches!(err, CreditScoreError::MissingArrayBoundary { .. }));
    }

    #[test]
    fn unparsable_prefix_is_fatal() {
        // the last `]` closes an inner array, leaving the outer one open
        let text = r#"[{"userWallet":"0xA","tags":["x"]},{"userWallet":"0xB""#;
        let err = parse_transactions(text, Path::new("log.json")).unwrap_err();
        assert!(matches!(err, CreditScoreError::MalformedJson { .. }));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{ONE_DEPOSIT}garbage").unwrap();
        let records = load_transactions(file.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn unreadable_path_reports_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_transactions(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CreditScoreError::Read { .. }));
    }
}
