//! Description strategy — static reference data.
//!
//! Retrieves one static column, optionally reached through a left-join chain
//! across the declared relations. The result covers only tickers present in
//! the base relation, in input order; there is no full-coverage guarantee
//! here (unlike the fundamental strategy, which backfills missing tickers).

use crate::domain::{cols, Value};
use crate::error::QueryError;
use crate::result::ResultTable;
use crate::store::{Relation, TableStore};
use std::collections::HashMap;

/// Retrieve a description field for the given tickers.
///
/// `relations[0]` is the base relation; each subsequent relation is
/// left-joined on the matching entry of `join_keys`. Non-matching join rows
/// yield null values for the joined columns.
pub fn retrieve(
    store: &TableStore,
    relations: &[String],
    join_keys: &[String],
    field: &str,
    tickers: &[String],
) -> Result<ResultTable, QueryError> {
    let base = store.get(relations.first().map(String::as_str).unwrap_or_default())?;
    let mut columns: Vec<String> = base.columns().to_vec();
    let mut rows: Vec<Vec<Value>> = base.rows().to_vec();

    for (i, name) in relations.iter().enumerate().skip(1) {
        let right = store.get(name)?;
        let key = join_keys
            .get(i - 1)
            .ok_or_else(|| QueryError::ColumnNotFound {
                relation: name.clone(),
                column: format!("join key #{i}"),
            })?;
        left_join(&mut columns, &mut rows, key, right)?;
    }

    let ticker_col = columns
        .iter()
        .position(|c| c == cols::TICKER)
        .ok_or_else(|| QueryError::ColumnNotFound {
            relation: relations[0].clone(),
            column: cols::TICKER.to_string(),
        })?;
    let field_col = columns
        .iter()
        .position(|c| c == field)
        .ok_or_else(|| QueryError::ColumnNotFound {
            relation: relations.last().cloned().unwrap_or_default(),
            column: field.to_string(),
        })?;

    tracing::debug!(field, rows = rows.len(), "description join complete");

    let mut index = Vec::new();
    let mut out_rows = Vec::new();
    for ticker in tickers {
        for row in &rows {
            if row[ticker_col].as_str() == Some(ticker.as_str()) {
                index.push(ticker.clone());
                out_rows.push(vec![row[field_col].clone()]);
            }
        }
    }

    Ok(ResultTable::new(index, vec![field.to_string()], out_rows))
}

/// Left-join `right` onto the working table on the named key column.
///
/// All right columns except the key are appended; names colliding with an
/// existing column get an `_r` suffix. Unmatched left rows get nulls.
fn left_join(
    columns: &mut Vec<String>,
    rows: &mut Vec<Vec<Value>>,
    key: &str,
    right: &Relation,
) -> Result<(), QueryError> {
    let left_key = columns
        .iter()
        .position(|c| c == key)
        .ok_or_else(|| QueryError::ColumnNotFound {
            relation: "<joined>".to_string(),
            column: key.to_string(),
        })?;
    let right_key = right.require_column(key)?;

    // First matching right row per key value.
    let mut lookup: HashMap<String, &Vec<Value>> = HashMap::new();
    for row in right.rows() {
        let cell = &row[right_key];
        if cell.is_null() {
            continue;
        }
        lookup.entry(cell.to_string()).or_insert(row);
    }

    let appended: Vec<(usize, String)> = right
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != right_key)
        .map(|(i, name)| {
            let name = if columns.iter().any(|c| c == name) {
                format!("{name}_r")
            } else {
                name.clone()
            };
            (i, name)
        })
        .collect();

    for row in rows.iter_mut() {
        let matched = if row[left_key].is_null() {
            None
        } else {
            lookup.get(&row[left_key].to_string())
        };
        for (src, _) in &appended {
            row.push(match matched {
                Some(r) => r[*src].clone(),
                None => Value::Null,
            });
        }
    }
    columns.extend(appended.into_iter().map(|(_, name)| name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Relation;

    fn cols_of(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn store() -> TableStore {
        let companies = Relation::new(
            "companies",
            cols_of(&["Ticker", "Company Name", "IndustryId"]),
            vec![
                vec!["AAPL".into(), "Apple Inc.".into(), Value::Int(101)],
                vec!["MSFT".into(), "Microsoft".into(), Value::Int(101)],
                vec!["XOM".into(), "Exxon Mobil".into(), Value::Int(205)],
                vec!["NEWCO".into(), "NewCo".into(), Value::Null],
            ],
        )
        .unwrap();
        let industries = Relation::new(
            "industries",
            cols_of(&["IndustryId", "Sector", "Industry"]),
            vec![
                vec![Value::Int(101), "Technology".into(), "Software".into()],
                vec![Value::Int(205), "Energy".into(), "Oil & Gas".into()],
            ],
        )
        .unwrap();
        TableStore::with_relations([companies, industries])
    }

    #[test]
    fn single_relation_lookup_preserves_input_order() {
        let store = store();
        let out = retrieve(
            &store,
            &["companies".to_string()],
            &[],
            "Company Name",
            &["MSFT".to_string(), "AAPL".to_string()],
        )
        .unwrap();

        assert_eq!(out.index(), &["MSFT".to_string(), "AAPL".to_string()]);
        assert_eq!(
            out.get(0, "Company Name"),
            Some(&Value::Str("Microsoft".into()))
        );
    }

    #[test]
    fn join_chain_reaches_sector() {
        let store = store();
        let out = retrieve(
            &store,
            &["companies".to_string(), "industries".to_string()],
            &["IndustryId".to_string()],
            "Sector",
            &["XOM".to_string(), "AAPL".to_string()],
        )
        .unwrap();

        assert_eq!(out.get(0, "Sector"), Some(&Value::Str("Energy".into())));
        assert_eq!(
            out.get(1, "Sector"),
            Some(&Value::Str("Technology".into()))
        );
    }

    #[test]
    fn unmatched_join_row_gets_null() {
        let store = store();
        let out = retrieve(
            &store,
            &["companies".to_string(), "industries".to_string()],
            &["IndustryId".to_string()],
            "Sector",
            &["NEWCO".to_string()],
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert!(out.get(0, "Sector").unwrap().is_null());
    }

    #[test]
    fn tickers_absent_from_base_relation_are_omitted() {
        let store = store();
        let out = retrieve(
            &store,
            &["companies".to_string()],
            &[],
            "Company Name",
            &["AAPL".to_string(), "ZZZZ".to_string()],
        )
        .unwrap();

        assert_eq!(out.index(), &["AAPL".to_string()]);
    }
}
