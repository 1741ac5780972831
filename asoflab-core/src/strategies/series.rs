//! Pricing and market-metric strategies — dated columns over a date range.
//!
//! Both fetch one dated column over `[start, end]`, expand to calendar days,
//! and optionally forward-fill. Pricing additionally reconstructs a
//! split/dividend-adjusted series by shifting the raw value by
//! `(Adj. Close - Close)` per row before field selection.
//!
//! When forward-fill is requested the fetch window is widened 10 days
//! earlier so the fill has something to seed from, then the result is
//! truncated back to `[start, end]`.

use crate::calendar::{expand_to_calendar, forward_fill, DatedValue};
use crate::domain::{cols, Value};
use crate::error::QueryError;
use crate::params::{PricingParams, SeriesParams};
use crate::result::ResultTable;
use crate::store::TableStore;
use chrono::Duration;
use std::collections::HashSet;

/// Days the fetch window is widened backwards to seed a forward-fill.
const FILL_LOOKBACK_DAYS: i64 = 10;

/// Retrieve a pricing field (optional split/dividend adjustment).
pub fn retrieve_pricing(
    store: &TableStore,
    relation: &str,
    field: &str,
    tickers: &[String],
    params: &PricingParams,
) -> Result<ResultTable, QueryError> {
    dated_series(store, relation, field, tickers, &params.series, params.adjust)
}

/// Retrieve a market-metric field (no adjustment support).
pub fn retrieve_market(
    store: &TableStore,
    relation: &str,
    field: &str,
    tickers: &[String],
    params: &SeriesParams,
) -> Result<ResultTable, QueryError> {
    dated_series(store, relation, field, tickers, params, false)
}

fn dated_series(
    store: &TableStore,
    relation: &str,
    field: &str,
    tickers: &[String],
    series: &SeriesParams,
    adjust: bool,
) -> Result<ResultTable, QueryError> {
    let rel = store.get(relation)?;
    let ticker_col = rel.require_column(cols::TICKER)?;
    let date_col = rel.require_column(cols::DATE)?;
    let field_col = rel.require_column(field)?;
    let adjust_cols = if adjust {
        Some((
            rel.require_column(cols::CLOSE)?,
            rel.require_column(cols::ADJ_CLOSE)?,
        ))
    } else {
        None
    };

    let fetch_start = if series.fill_prev {
        series.start - Duration::days(FILL_LOOKBACK_DAYS)
    } else {
        series.start
    };

    let wanted: HashSet<&str> = tickers.iter().map(String::as_str).collect();
    let mut sparse = Vec::new();
    for row in rel.rows() {
        let Some(ticker) = row[ticker_col].as_str() else {
            continue;
        };
        if !wanted.contains(ticker) {
            continue;
        }
        let Some(date) = row[date_col].as_date() else {
            continue;
        };
        if date < fetch_start || date > series.end {
            continue;
        }

        let mut value = row[field_col].clone();
        if let Some((close_col, adj_col)) = adjust_cols {
            value = match (
                value.as_f64(),
                row[close_col].as_f64(),
                row[adj_col].as_f64(),
            ) {
                (Some(v), Some(close), Some(adj)) => Value::Num(v + (adj - close)),
                _ => Value::Null,
            };
        }

        sparse.push(DatedValue {
            ticker: ticker.to_string(),
            date,
            value,
        });
    }

    tracing::debug!(
        relation,
        field,
        events = sparse.len(),
        fill = series.fill_prev,
        "dated series fetched"
    );

    // Expansion iterates the normalized input ticker order, so the dense
    // grid already restores the requested row order.
    let mut dense = expand_to_calendar(&sparse, tickers, fetch_start, series.end);
    if series.fill_prev {
        forward_fill(&mut dense);
    }

    let mut index = Vec::new();
    let mut rows = Vec::new();
    for point in dense {
        if point.date < series.start {
            continue; // discard the fill seed window
        }
        index.push(point.ticker);
        rows.push(vec![Value::Date(point.date), point.value]);
    }

    Ok(ResultTable::new(
        index,
        vec![cols::DATE.to_string(), field.to_string()],
        rows,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Relation;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn price_row(ticker: &str, day: &str, close: f64, adj_close: f64) -> Vec<Value> {
        vec![
            ticker.into(),
            Value::Date(date(day)),
            Value::Num(close),
            Value::Num(adj_close),
        ]
    }

    fn store() -> TableStore {
        let rel = Relation::new(
            "shareprices-daily",
            vec![
                "Ticker".to_string(),
                "Date".to_string(),
                "Close".to_string(),
                "Adj. Close".to_string(),
            ],
            vec![
                price_row("AAPL", "2022-12-28", 95.0, 93.0),
                price_row("AAPL", "2023-01-02", 100.0, 98.0),
                price_row("AAPL", "2023-01-04", 104.0, 102.0),
                price_row("MSFT", "2023-01-02", 240.0, 240.0),
            ],
        )
        .unwrap();
        TableStore::with_relations([rel])
    }

    fn series(start: &str, end: &str, fill_prev: bool) -> SeriesParams {
        SeriesParams {
            start: date(start),
            end: date(end),
            fill_prev,
        }
    }

    #[test]
    fn adjusted_close_shifts_by_adjustment_factor() {
        let store = store();
        let params = PricingParams {
            series: series("2023-01-02", "2023-01-02", false),
            adjust: true,
        };
        let out = retrieve_pricing(
            &store,
            "shareprices-daily",
            "Close",
            &["AAPL".to_string()],
            &params,
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        // 100 + (98 - 100) = 98
        assert_eq!(out.get(0, "Close"), Some(&Value::Num(98.0)));
    }

    #[test]
    fn unadjusted_close_is_raw() {
        let store = store();
        let params = PricingParams {
            series: series("2023-01-02", "2023-01-02", false),
            adjust: false,
        };
        let out = retrieve_pricing(
            &store,
            "shareprices-daily",
            "Close",
            &["AAPL".to_string()],
            &params,
        )
        .unwrap();
        assert_eq!(out.get(0, "Close"), Some(&Value::Num(100.0)));
    }

    #[test]
    fn calendar_expansion_covers_full_range_per_ticker() {
        let store = store();
        let out = retrieve_market(
            &store,
            "shareprices-daily",
            "Close",
            &["AAPL".to_string(), "MSFT".to_string()],
            &series("2023-01-01", "2023-01-05", false),
        )
        .unwrap();

        assert_eq!(out.len(), 10); // 5 days x 2 tickers
        assert_eq!(out.index()[0], "AAPL");
        assert_eq!(out.index()[5], "MSFT");
        // Gap day stays null without fill_prev.
        assert!(out.get(2, "Close").unwrap().is_null()); // AAPL 2023-01-03
    }

    #[test]
    fn fill_prev_seeds_from_lookback_and_truncates() {
        let store = store();
        let out = retrieve_market(
            &store,
            "shareprices-daily",
            "Close",
            &["AAPL".to_string()],
            &series("2023-01-01", "2023-01-03", true),
        )
        .unwrap();

        // 2023-01-01 has no event but the 2022-12-28 row seeds the fill.
        assert_eq!(out.len(), 3);
        assert_eq!(out.get(0, "Date"), Some(&Value::Date(date("2023-01-01"))));
        assert_eq!(out.get(0, "Close"), Some(&Value::Num(95.0)));
        assert_eq!(out.get(1, "Close"), Some(&Value::Num(100.0)));
        assert_eq!(out.get(2, "Close"), Some(&Value::Num(100.0)));
    }

    #[test]
    fn missing_field_column_is_fatal() {
        let store = store();
        let err = retrieve_market(
            &store,
            "shareprices-daily",
            "Volume",
            &["AAPL".to_string()],
            &series("2023-01-01", "2023-01-02", false),
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::ColumnNotFound { .. }));
    }
}
