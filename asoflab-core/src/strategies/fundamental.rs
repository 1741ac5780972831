//! Fundamental strategy — point-in-time report resolution.
//!
//! Everything here is built on one guarantee: a query with as-of date D sees
//! exactly the reports published on or before D, with restatements
//! superseding the originals. On top of that slice, reports are addressed
//! either relative to the latest known report (offset mode), by absolute
//! fiscal period, or swept across a range of as-of dates where each publish
//! event shifts which reports are known.

use crate::domain::{cols, ReportRow, Value};
use crate::error::QueryError;
use crate::params::{FundamentalParams, PeriodAddress, PeriodType};
use crate::result::ResultTable;
use crate::store::{Relation, TableStore};
use chrono::{Duration, NaiveDate};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Per-period-type relation names, resolved from the field catalog.
#[derive(Debug, Clone, Copy)]
pub struct FundamentalSource<'a> {
    pub quarterly: &'a str,
    pub annual: &'a str,
    pub ttm: &'a str,
}

/// Retrieve a fundamental field for the given tickers.
pub fn retrieve(
    store: &TableStore,
    source: FundamentalSource<'_>,
    field: &str,
    tickers: &[String],
    params: &FundamentalParams,
) -> Result<ResultTable, QueryError> {
    let relation_name = match params.period_type {
        PeriodType::Quarterly => source.quarterly,
        PeriodType::Annual => source.annual,
        PeriodType::Ttm => source.ttm,
    };
    let relation = store.get(relation_name)?;
    let columns = ReportColumns::resolve(relation, field)?;
    let ctx = SliceCtx {
        relation,
        columns,
        tickers,
    };

    tracing::debug!(
        relation = relation_name,
        field,
        tickers = tickers.len(),
        range = params.is_range(),
        "fundamental retrieval"
    );

    match &params.address {
        PeriodAddress::Offset { start, end } if params.is_range() => range_sweep(
            &ctx,
            *start,
            *end,
            params.as_of_start,
            params.as_of_end,
            field,
        ),
        address => {
            // The single as-of date is the range end (start == end here for
            // well-formed single queries).
            let selected = select_as_of(&ctx, address, params.as_of_end);
            Ok(build_table(selected, tickers, field))
        }
    }
}

/// Column positions for the report-shaped relations.
struct ReportColumns {
    ticker: usize,
    report_date: usize,
    publish_date: usize,
    fiscal_year: usize,
    fiscal_period: usize,
    value: usize,
}

impl ReportColumns {
    fn resolve(relation: &Relation, field: &str) -> Result<Self, QueryError> {
        Ok(Self {
            ticker: relation.require_column(cols::TICKER)?,
            report_date: relation.require_column(cols::REPORT_DATE)?,
            publish_date: relation.require_column(cols::PUBLISH_DATE)?,
            fiscal_year: relation.require_column(cols::FISCAL_YEAR)?,
            fiscal_period: relation.require_column(cols::FISCAL_PERIOD)?,
            value: relation.require_column(field)?,
        })
    }
}

struct SliceCtx<'a> {
    relation: &'a Relation,
    columns: ReportColumns,
    tickers: &'a [String],
}

/// One selected report (or the null backfill) for one ticker at one as-of
/// date.
#[derive(Debug, Clone)]
struct Selected {
    ticker: String,
    as_of: NaiveDate,
    report: Option<ReportRow>,
}

/// The point-in-time slice: reports for the requested tickers published on
/// or before `as_of`, with at most one surviving row per
/// (ticker, report date) — the one with the latest publish date.
///
/// Tie-break among equal publish dates: stable sort by (ticker, publish
/// date) ascending, take the last.
fn point_in_time_slice(ctx: &SliceCtx<'_>, as_of: NaiveDate) -> Vec<ReportRow> {
    let wanted: HashSet<&str> = ctx.tickers.iter().map(String::as_str).collect();
    let c = &ctx.columns;

    let mut slice: Vec<ReportRow> = Vec::new();
    for row in ctx.relation.rows() {
        let Some(ticker) = row[c.ticker].as_str() else {
            continue;
        };
        if !wanted.contains(ticker) {
            continue;
        }
        let (Some(report_date), Some(publish_date)) =
            (row[c.report_date].as_date(), row[c.publish_date].as_date())
        else {
            tracing::warn!(
                relation = ctx.relation.name(),
                ticker,
                "report row with unreadable dates skipped"
            );
            continue;
        };
        if publish_date > as_of {
            continue;
        }
        slice.push(ReportRow {
            ticker: ticker.to_string(),
            report_date,
            publish_date,
            fiscal_year: row[c.fiscal_year].as_i64(),
            fiscal_period: row[c.fiscal_period].as_str().map(str::to_string),
            value: row[c.value].clone(),
        });
    }

    slice.sort_by(|a, b| {
        (a.ticker.as_str(), a.publish_date).cmp(&(b.ticker.as_str(), b.publish_date))
    });

    // A restatement supersedes the original: within each (ticker, report
    // date) group the last row in publish order wins.
    let mut dedup: Vec<ReportRow> = Vec::new();
    let mut pos: HashMap<(String, NaiveDate), usize> = HashMap::new();
    for report in slice {
        match pos.entry((report.ticker.clone(), report.report_date)) {
            Entry::Occupied(e) => dedup[*e.get()] = report,
            Entry::Vacant(e) => {
                e.insert(dedup.len());
                dedup.push(report);
            }
        }
    }

    dedup.sort_by(|a, b| {
        (a.ticker.as_str(), a.report_date).cmp(&(b.ticker.as_str(), b.report_date))
    });
    dedup
}

/// Resolve the addressing mode against the slice at one as-of date,
/// backfilling a null row for every requested ticker with no matching
/// reports.
fn select_as_of(ctx: &SliceCtx<'_>, address: &PeriodAddress, as_of: NaiveDate) -> Vec<Selected> {
    let slice = point_in_time_slice(ctx, as_of);

    let mut by_ticker: HashMap<&str, Vec<&ReportRow>> = HashMap::new();
    for report in &slice {
        by_ticker.entry(report.ticker.as_str()).or_default().push(report);
    }

    let mut out = Vec::new();
    for ticker in ctx.tickers {
        let reports = by_ticker
            .get(ticker.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let chosen: Vec<&ReportRow> = match address {
            PeriodAddress::Offset { start, end } => offset_window(reports, *start, *end),
            PeriodAddress::Absolute {
                year_start,
                year_end,
                quarters,
            } => absolute_window(reports, *year_start, *year_end, *quarters),
        };

        if chosen.is_empty() {
            out.push(Selected {
                ticker: ticker.clone(),
                as_of,
                report: None,
            });
        } else {
            out.extend(chosen.into_iter().map(|r| Selected {
                ticker: ticker.clone(),
                as_of,
                report: Some(r.clone()),
            }));
        }
    }
    out
}

/// Select the index window `[last + start, last + end]` (inclusive) from a
/// ticker's reports, sorted by report date ascending. Positions outside the
/// available history are dropped.
fn offset_window<'a>(reports: &[&'a ReportRow], start: i64, end: i64) -> Vec<&'a ReportRow> {
    if reports.is_empty() {
        return Vec::new();
    }
    let last = reports.len() as i64 - 1;
    let lo = (last + start).max(0);
    let hi = (last + end).min(last);
    if lo > hi {
        return Vec::new();
    }
    reports[lo as usize..=hi as usize].to_vec()
}

/// Filter a ticker's reports to the inclusive absolute fiscal window.
fn absolute_window<'a>(
    reports: &[&'a ReportRow],
    year_start: i64,
    year_end: i64,
    quarters: Option<(i64, i64)>,
) -> Vec<&'a ReportRow> {
    reports
        .iter()
        .filter(|r| {
            let Some(year) = r.fiscal_year else {
                return false;
            };
            if year < year_start || year > year_end {
                return false;
            }
            match quarters {
                Some((q_start, q_end)) => match r.fiscal_period.as_deref().and_then(fiscal_quarter)
                {
                    Some(q) => q >= q_start && q <= q_end,
                    None => false,
                },
                None => true,
            }
        })
        .copied()
        .collect()
}

/// Fiscal quarter from the trailing digit of a period label ("Q3" -> 3).
fn fiscal_quarter(period: &str) -> Option<i64> {
    period
        .trim()
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .map(i64::from)
}

/// Sweep the offset-period query across every day in `[start, end]`.
///
/// Reports only change when something is published, so the query is
/// recomputed on days with a publish event in the ticker set (the range
/// start always counts as one) and the prior day's frame is carried forward
/// otherwise, with its as-of column advanced. The recompute is global: any
/// event day refreshes all tickers.
fn range_sweep(
    ctx: &SliceCtx<'_>,
    offset_start: i64,
    offset_end: i64,
    start: NaiveDate,
    end: NaiveDate,
    field: &str,
) -> Result<ResultTable, QueryError> {
    let wanted: HashSet<&str> = ctx.tickers.iter().map(String::as_str).collect();
    let c = &ctx.columns;

    let mut events: BTreeSet<NaiveDate> = BTreeSet::new();
    for row in ctx.relation.rows() {
        let Some(ticker) = row[c.ticker].as_str() else {
            continue;
        };
        if !wanted.contains(ticker) {
            continue;
        }
        if let Some(publish) = row[c.publish_date].as_date() {
            if publish >= start && publish <= end {
                events.insert(publish);
            }
        }
    }
    if events.is_empty() {
        return Err(QueryError::NoSufficientData { start, end });
    }
    events.insert(start);

    let address = PeriodAddress::Offset {
        start: offset_start,
        end: offset_end,
    };

    let mut all: Vec<Selected> = Vec::new();
    let mut carried: Vec<Selected> = Vec::new();
    let mut day = start;
    while day <= end {
        if events.contains(&day) {
            carried = select_as_of(ctx, &address, day);
        } else {
            for sel in &mut carried {
                sel.as_of = day;
            }
        }
        all.extend(carried.iter().cloned());
        day += Duration::days(1);
    }

    Ok(build_table(all, ctx.tickers, field))
}

/// Final assembly: restore (input ticker order, as-of date, report date,
/// publish date) ordering and materialize the column layout.
fn build_table(mut selected: Vec<Selected>, tickers: &[String], field: &str) -> ResultTable {
    let order: HashMap<&str, usize> = tickers
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    selected.sort_by(|a, b| {
        let key = |s: &Selected| {
            (
                order.get(s.ticker.as_str()).copied().unwrap_or(usize::MAX),
                s.as_of,
                s.report.as_ref().map(|r| r.report_date),
                s.report.as_ref().map(|r| r.publish_date),
            )
        };
        key(a).cmp(&key(b))
    });

    let columns = vec![
        cols::REPORT_DATE.to_string(),
        cols::PUBLISH_DATE.to_string(),
        cols::FISCAL_YEAR.to_string(),
        cols::FISCAL_PERIOD.to_string(),
        cols::AS_OF_DATE.to_string(),
        field.to_string(),
    ];

    let mut index = Vec::with_capacity(selected.len());
    let mut rows = Vec::with_capacity(selected.len());
    for sel in selected {
        index.push(sel.ticker);
        rows.push(match sel.report {
            Some(r) => vec![
                Value::Date(r.report_date),
                Value::Date(r.publish_date),
                r.fiscal_year.map(Value::Int).unwrap_or(Value::Null),
                r.fiscal_period.map(Value::Str).unwrap_or(Value::Null),
                Value::Date(sel.as_of),
                r.value,
            ],
            None => vec![
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Date(sel.as_of),
                Value::Null,
            ],
        });
    }

    ResultTable::new(index, columns, rows)
}
