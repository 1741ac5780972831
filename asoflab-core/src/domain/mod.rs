//! Domain types — relation cell values, ticker normalization, report rows.

mod value;

pub use value::Value;

use chrono::NaiveDate;

/// Well-known column names shared by the bundled relations.
///
/// Relations are produced by a controlled loader, so lookups are exact.
pub mod cols {
    pub const TICKER: &str = "Ticker";
    pub const DATE: &str = "Date";
    pub const CLOSE: &str = "Close";
    pub const ADJ_CLOSE: &str = "Adj. Close";
    pub const REPORT_DATE: &str = "Report Date";
    pub const PUBLISH_DATE: &str = "Publish Date";
    pub const FISCAL_YEAR: &str = "Fiscal Year";
    pub const FISCAL_PERIOD: &str = "Fiscal Period";
    pub const AS_OF_DATE: &str = "As of Date";
    pub const INDUSTRY_ID: &str = "IndustryId";
}

/// One fundamental report as seen by the period resolver.
///
/// Invariant after the point-in-time slice: per (ticker, report_date) at most
/// one row survives — the one with the latest publish date known as of the
/// query's as-of date.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub ticker: String,
    pub report_date: NaiveDate,
    pub publish_date: NaiveDate,
    pub fiscal_year: Option<i64>,
    pub fiscal_period: Option<String>,
    pub value: Value,
}

/// Normalize a requested ticker list: uppercase, trim, and de-duplicate
/// preserving the first occurrence. Output order is the row order every
/// result table restores at the end of a query.
pub fn normalize_tickers<S: AsRef<str>>(tickers: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(tickers.len());
    for t in tickers {
        let norm = t.as_ref().trim().to_uppercase();
        if norm.is_empty() {
            continue;
        }
        if seen.insert(norm.clone()) {
            out.push(norm);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickers_uppercased_and_trimmed() {
        let out = normalize_tickers(&[" aapl ", "msft"]);
        assert_eq!(out, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let out = normalize_tickers(&["AAPL", "msft", "aapl", "MSFT", "GOOG"]);
        assert_eq!(out, vec!["AAPL", "MSFT", "GOOG"]);
    }

    #[test]
    fn empty_entries_dropped() {
        let out = normalize_tickers(&["", "  ", "SPY"]);
        assert_eq!(out, vec!["SPY"]);
    }
}
