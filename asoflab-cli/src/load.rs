//! Loading relations from semicolon-separated CSV files and the field
//! catalog from its TOML sidecar.

use anyhow::{bail, Context, Result};
use asoflab_core::catalog::{FieldCatalog, FieldKind, FieldSpec, Strategy};
use asoflab_core::{Relation, TableStore, Value};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load every `*.csv` in the directory into a named relation.
///
/// The relation name is the file stem with any `us-` prefix removed
/// (`us-income-ttm.csv` becomes `income-ttm`). Hidden files are skipped.
pub fn load_relations(dir: &Path, delimiter: u8) -> Result<TableStore> {
    let mut store = TableStore::new();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("reading data directory {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') || path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let stem = file_name.trim_end_matches(".csv");
        let name = stem.strip_prefix("us-").unwrap_or(stem);

        let relation = load_csv(&path, name, delimiter)
            .with_context(|| format!("loading {}", path.display()))?;
        tracing::info!(relation = name, rows = relation.len(), "relation loaded");
        store.insert(relation);
    }

    if store.is_empty() {
        bail!("no CSV relations found in {}", dir.display());
    }
    Ok(store)
}

fn load_csv(path: &Path, name: &str, delimiter: u8) -> Result<Relation> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    // Columns whose header mentions "date" are parsed as calendar dates.
    let date_cols: Vec<bool> = headers
        .iter()
        .map(|h| h.to_lowercase().contains("date"))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<Value> = record
            .iter()
            .zip(&date_cols)
            .map(|(cell, is_date)| parse_cell(cell, *is_date))
            .collect();
        rows.push(row);
    }

    Ok(Relation::new(name, headers, rows)?)
}

/// Infer a cell value. Empty cells are null; date columns must parse as
/// ISO dates; other cells try integer, then float, then fall back to text.
fn parse_cell(cell: &str, is_date: bool) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if is_date {
        return match NaiveDate::parse_from_str(cell, DATE_FORMAT) {
            Ok(d) => Value::Date(d),
            Err(_) => {
                tracing::warn!(cell, "unparseable date cell treated as null");
                Value::Null
            }
        };
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(n) = cell.parse::<f64>() {
        return Value::Num(n);
    }
    Value::Str(cell.to_string())
}

/// On-disk field catalog entry. The `strategy` tag picks which of the
/// source keys must be present.
#[derive(Debug, Deserialize)]
struct RawField {
    long_name: String,
    short_name: String,
    strategy: String,
    #[serde(default)]
    relations: Vec<String>,
    #[serde(default)]
    join_keys: Vec<String>,
    #[serde(default)]
    relation: Option<String>,
    #[serde(default)]
    quarterly: Option<String>,
    #[serde(default)]
    annual: Option<String>,
    #[serde(default)]
    ttm: Option<String>,
    #[serde(default)]
    params: String,
    #[serde(default)]
    doc: String,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    field: Vec<RawField>,
}

/// Load the field catalog from a TOML sidecar.
pub fn load_catalog(path: &Path) -> Result<FieldCatalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading field catalog {}", path.display()))?;
    let raw: RawCatalog = toml::from_str(&text)
        .with_context(|| format!("parsing field catalog {}", path.display()))?;

    let mut fields = Vec::with_capacity(raw.field.len());
    for f in raw.field {
        let kind = field_kind(&f)
            .with_context(|| format!("field catalog entry '{}'", f.long_name))?;
        fields.push(FieldSpec {
            long_name: f.long_name,
            short_name: f.short_name,
            kind,
            params_doc: f.params,
            doc: f.doc,
        });
    }
    tracing::info!(fields = fields.len(), "field catalog loaded");
    Ok(FieldCatalog::new(fields))
}

fn field_kind(f: &RawField) -> Result<FieldKind> {
    let strategy = Strategy::parse(&f.strategy)?;
    Ok(match strategy {
        Strategy::Description => {
            if f.relations.is_empty() {
                bail!("description fields need at least one relation");
            }
            FieldKind::Description {
                relations: f.relations.clone(),
                join_keys: f.join_keys.clone(),
            }
        }
        Strategy::Pricing => FieldKind::Pricing {
            relation: required(&f.relation, "relation")?,
        },
        Strategy::MarketMetric => FieldKind::MarketMetric {
            relation: required(&f.relation, "relation")?,
        },
        Strategy::Fundamental => FieldKind::Fundamental {
            quarterly: required(&f.quarterly, "quarterly")?,
            annual: required(&f.annual, "annual")?,
            ttm: required(&f.ttm, "ttm")?,
        },
    })
}

fn required(value: &Option<String>, key: &str) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| anyhow::anyhow!("missing '{key}' source key"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_inference_orders_int_float_text() {
        assert_eq!(parse_cell("42", false), Value::Int(42));
        assert_eq!(parse_cell("42.5", false), Value::Num(42.5));
        assert_eq!(parse_cell("AAPL", false), Value::Str("AAPL".into()));
        assert!(parse_cell("", false).is_null());
        assert!(parse_cell("  ", true).is_null());
        assert_eq!(
            parse_cell("2023-01-02", true),
            Value::Date(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap())
        );
    }

    #[test]
    fn catalog_toml_round_trip() {
        let toml = r#"
            [[field]]
            long_name = "Revenue"
            short_name = "rev"
            strategy = "fundamental"
            quarterly = "income-quarterly"
            annual = "income-annual"
            ttm = "income-ttm"
            doc = "Trailing revenue"

            [[field]]
            long_name = "Sector"
            short_name = "sec"
            strategy = "description"
            relations = ["companies", "industries"]
            join_keys = ["IndustryId"]
        "#;
        let raw: RawCatalog = toml::from_str(toml).unwrap();
        assert_eq!(raw.field.len(), 2);
        assert!(matches!(
            field_kind(&raw.field[0]).unwrap(),
            FieldKind::Fundamental { .. }
        ));
        assert!(matches!(
            field_kind(&raw.field[1]).unwrap(),
            FieldKind::Description { .. }
        ));
    }

    #[test]
    fn unknown_strategy_tag_fails_loading() {
        let raw = RawField {
            long_name: "X".into(),
            short_name: "x".into(),
            strategy: "technical".into(),
            relations: vec![],
            join_keys: vec![],
            relation: None,
            quarterly: None,
            annual: None,
            ttm: None,
            params: String::new(),
            doc: String::new(),
        };
        assert!(field_kind(&raw).is_err());
    }
}
