//! Universe listing — which tickers and classifications exist as of a date.

use crate::domain::cols;
use crate::error::QueryError;
use crate::store::TableStore;
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

/// Relation names the listing helpers read from.
pub const INDUSTRIES: &str = "industries";
pub const COMPANIES: &str = "companies";
pub const DAILY_PRICES: &str = "shareprices-daily";

/// A ticker counts as active when it printed a price within this many days
/// before the as-of date.
const ACTIVE_WINDOW_DAYS: i64 = 5;

/// Distinct classification values at the given level ("sector" or
/// "industry", case-insensitive), in first-occurrence order.
pub fn classification_values(store: &TableStore, level: &str) -> Result<Vec<String>, QueryError> {
    let industries = store.get(INDUSTRIES)?;
    let col = industries.require_column(&title_case(level))?;

    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for row in industries.rows() {
        if let Some(value) = row[col].as_str() {
            if seen.insert(value) {
                out.push(value.to_string());
            }
        }
    }
    Ok(out)
}

/// All tickers active as of the given date: a price row must exist in
/// `[as_of - 5 days, as_of]`.
pub fn all_tickers(store: &TableStore, as_of: NaiveDate) -> Result<Vec<String>, QueryError> {
    active_tickers(store, as_of, None)
}

/// Tickers active as of the given date whose classification at `level`
/// matches any of `values`.
pub fn tickers_by_classification(
    store: &TableStore,
    values: &[String],
    level: &str,
    as_of: NaiveDate,
) -> Result<Vec<String>, QueryError> {
    let industries = store.get(INDUSTRIES)?;
    let level_col = industries.require_column(&title_case(level))?;
    let industry_id_col = industries.require_column(cols::INDUSTRY_ID)?;

    let wanted: HashSet<&str> = values.iter().map(String::as_str).collect();
    let industry_ids: HashSet<String> = industries
        .rows()
        .iter()
        .filter(|row| row[level_col].as_str().is_some_and(|v| wanted.contains(v)))
        .map(|row| row[industry_id_col].to_string())
        .collect();

    let companies = store.get(COMPANIES)?;
    let ticker_col = companies.require_column(cols::TICKER)?;
    let company_industry_col = companies.require_column(cols::INDUSTRY_ID)?;

    let members: HashSet<&str> = companies
        .rows()
        .iter()
        .filter(|row| industry_ids.contains(&row[company_industry_col].to_string()))
        .filter_map(|row| row[ticker_col].as_str())
        .collect();

    active_tickers(store, as_of, Some(&members))
}

/// Tickers with a price in the activity window, optionally restricted to a
/// membership set, in first-occurrence order of the price relation.
fn active_tickers(
    store: &TableStore,
    as_of: NaiveDate,
    members: Option<&HashSet<&str>>,
) -> Result<Vec<String>, QueryError> {
    let prices = store.get(DAILY_PRICES)?;
    let ticker_col = prices.require_column(cols::TICKER)?;
    let date_col = prices.require_column(cols::DATE)?;
    let window_start = as_of - Duration::days(ACTIVE_WINDOW_DAYS);

    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for row in prices.rows() {
        let Some(ticker) = row[ticker_col].as_str() else {
            continue;
        };
        if members.is_some_and(|m| !m.contains(ticker)) || seen.contains(ticker) {
            continue;
        }
        let Some(date) = row[date_col].as_date() else {
            continue;
        };
        if date >= window_start && date <= as_of {
            seen.insert(ticker);
            out.push(ticker.to_string());
        }
    }

    tracing::debug!(as_of = %as_of, active = out.len(), "universe listed");
    Ok(out)
}

/// "sector" -> "Sector", matching the relation's header casing.
fn title_case(level: &str) -> String {
    let level = level.trim();
    let mut chars = level.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
