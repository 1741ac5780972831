//! Calendar expansion — densify sparse dated rows to one row per ticker per
//! calendar day.
//!
//! Trading-day data has gaps (weekends, holidays, halts) that downstream
//! consumers need calendar-aligned. Expansion is an explicit cross-join of
//! (tickers × days) left-joined against the sparse rows; missing events
//! become nulls. Forward-fill, when requested, runs strictly per ticker so
//! one ticker's values can never bleed into another's leading gap.

use crate::domain::Value;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// One sparse or dense observation.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedValue {
    pub ticker: String,
    pub date: NaiveDate,
    pub value: Value,
}

/// Expand sparse rows to a dense (ticker × calendar day) grid over the
/// inclusive `[start, end]` range.
///
/// Output is ordered by (ticker in the order given, date ascending) and has
/// exactly `end - start + 1` rows per ticker. Duplicate sparse rows for the
/// same (ticker, date) resolve to the last one.
pub fn expand_to_calendar(
    sparse: &[DatedValue],
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DatedValue> {
    let mut events: HashMap<(&str, NaiveDate), &Value> = HashMap::new();
    for point in sparse {
        events.insert((point.ticker.as_str(), point.date), &point.value);
    }

    let mut dense = Vec::new();
    for ticker in tickers {
        let mut day = start;
        while day <= end {
            let value = events
                .get(&(ticker.as_str(), day))
                .map(|v| (*v).clone())
                .unwrap_or(Value::Null);
            dense.push(DatedValue {
                ticker: ticker.clone(),
                date: day,
                value,
            });
            day += Duration::days(1);
        }
    }
    dense
}

/// Carry the last non-null value forward across gaps, per ticker.
///
/// Expects rows grouped by ticker with dates ascending within each group,
/// which is what [`expand_to_calendar`] produces.
pub fn forward_fill(rows: &mut [DatedValue]) {
    let mut run_start = 0;
    while run_start < rows.len() {
        let mut run_end = run_start + 1;
        while run_end < rows.len() && rows[run_end].ticker == rows[run_start].ticker {
            run_end += 1;
        }

        let mut carried: Option<Value> = None;
        for row in &mut rows[run_start..run_end] {
            if row.value.is_null() {
                if let Some(prev) = &carried {
                    row.value = prev.clone();
                }
            } else {
                carried = Some(row.value.clone());
            }
        }

        run_start = run_end;
    }
}
