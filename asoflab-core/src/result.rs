//! Result table — the ephemeral output of one query.

use crate::domain::Value;
use serde::Serialize;

/// A query result: a ticker index plus date/period and value columns.
///
/// Invariants:
/// - Row order follows the de-duplicated, case-normalized input ticker order
///   exactly (then as-of date, then report/event date within a ticker).
/// - For the fundamental strategy every requested ticker appears, with an
///   all-null row when it has no data — tickers are never silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct ResultTable {
    /// Ticker per row (the row index).
    index: Vec<String>,
    /// Names of the non-index columns.
    columns: Vec<String>,
    /// Cell data, one inner vector per row, aligned with `columns`.
    rows: Vec<Vec<Value>>,
}

impl ResultTable {
    /// Assemble a result table. Callers guarantee the ordering invariants;
    /// shapes are checked here.
    pub(crate) fn new(index: Vec<String>, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert_eq!(index.len(), rows.len());
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            index,
            columns,
            rows,
        }
    }

    /// Ticker per row, in result order.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell accessor by row position and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// All rows for one ticker, in result order.
    pub fn rows_for_ticker<'a>(
        &'a self,
        ticker: &'a str,
    ) -> impl Iterator<Item = &'a Vec<Value>> + 'a {
        self.index
            .iter()
            .zip(self.rows.iter())
            .filter(move |(t, _)| t.as_str() == ticker)
            .map(|(_, row)| row)
    }

    /// Distinct tickers in row order (first occurrence).
    pub fn distinct_tickers(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for t in &self.index {
            if out.last() != Some(&t.as_str()) && !out.contains(&t.as_str()) {
                out.push(t);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResultTable {
        ResultTable::new(
            vec!["AAPL".into(), "AAPL".into(), "MSFT".into()],
            vec!["Date".into(), "Close".into()],
            vec![
                vec![Value::Str("d1".into()), Value::Num(1.0)],
                vec![Value::Str("d2".into()), Value::Num(2.0)],
                vec![Value::Str("d1".into()), Value::Num(3.0)],
            ],
        )
    }

    #[test]
    fn cell_lookup_by_column_name() {
        let t = table();
        assert_eq!(t.get(1, "Close"), Some(&Value::Num(2.0)));
        assert!(t.get(0, "Open").is_none());
    }

    #[test]
    fn rows_for_ticker_filters_by_index() {
        let t = table();
        assert_eq!(t.rows_for_ticker("AAPL").count(), 2);
        assert_eq!(t.rows_for_ticker("MSFT").count(), 1);
        assert_eq!(t.distinct_tickers(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn serializes_to_json() {
        let t = table();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["index"][2], "MSFT");
        assert_eq!(json["rows"][2][1], 3.0);
    }
}
