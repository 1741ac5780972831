//! Table store — named, immutable in-memory relations.
//!
//! Relations are read-only after construction. Concurrent readers are safe
//! without locking because queries never mutate state. Reloading data means
//! building a fresh `TableStore` (and catalog) and swapping the engine
//! context reference; an in-place reload is deliberately not offered.

use crate::domain::Value;
use crate::error::QueryError;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from relation construction (the loading edge, not query time).
#[derive(Debug, Error)]
pub enum RelationError {
    #[error("relation '{relation}': row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        relation: String,
        row: usize,
        got: usize,
        expected: usize,
    },
    #[error("relation '{relation}': duplicate column '{column}'")]
    DuplicateColumn { relation: String, column: String },
}

/// A named, immutable table. Rows are keyed by ticker (plus an event date
/// for time-series relations); the store itself imposes no schema beyond
/// rectangularity.
#[derive(Debug, Clone)]
pub struct Relation {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Relation {
    /// Build a relation, validating that every row matches the header width
    /// and that column names are unique.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, RelationError> {
        let name = name.into();
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c == col) {
                return Err(RelationError::DuplicateColumn {
                    relation: name,
                    column: col.clone(),
                });
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(RelationError::RaggedRow {
                    relation: name,
                    row: i,
                    got: row.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(Self {
            name,
            columns,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
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

    /// Position of a column by exact name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Position of a column, failing with the query-level error when absent.
    pub fn require_column(&self, column: &str) -> Result<usize, QueryError> {
        self.column_index(column)
            .ok_or_else(|| QueryError::ColumnNotFound {
                relation: self.name.clone(),
                column: column.to_string(),
            })
    }
}

/// Holder of all named relations available to the engine.
#[derive(Debug, Default, Clone)]
pub struct TableStore {
    relations: BTreeMap<String, Relation>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a batch of relations. Later duplicates replace
    /// earlier ones, matching a loader that re-reads the same file name.
    pub fn with_relations(relations: impl IntoIterator<Item = Relation>) -> Self {
        let mut store = Self::new();
        for rel in relations {
            store.insert(rel);
        }
        store
    }

    pub fn insert(&mut self, relation: Relation) {
        self.relations.insert(relation.name().to_string(), relation);
    }

    /// Look up a relation by name.
    pub fn get(&self, name: &str) -> Result<&Relation, QueryError> {
        self.relations
            .get(name)
            .ok_or_else(|| QueryError::RelationNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.relations.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn relation_rejects_ragged_rows() {
        let err = Relation::new(
            "t",
            cols(&["A", "B"]),
            vec![vec![Value::Int(1), Value::Int(2)], vec![Value::Int(3)]],
        )
        .unwrap_err();
        assert!(matches!(err, RelationError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn relation_rejects_duplicate_columns() {
        let err = Relation::new("t", cols(&["A", "A"]), vec![]).unwrap_err();
        assert!(matches!(err, RelationError::DuplicateColumn { .. }));
    }

    #[test]
    fn store_lookup_and_missing() {
        let rel = Relation::new("companies", cols(&["Ticker"]), vec![vec!["AAPL".into()]]).unwrap();
        let store = TableStore::with_relations([rel]);

        assert_eq!(store.get("companies").unwrap().len(), 1);
        assert_eq!(
            store.get("nope").unwrap_err(),
            QueryError::RelationNotFound("nope".into())
        );
        assert_eq!(store.names(), vec!["companies"]);
    }

    #[test]
    fn column_lookup_is_exact() {
        let rel = Relation::new("t", cols(&["Ticker", "Close"]), vec![]).unwrap();
        assert_eq!(rel.column_index("Close"), Some(1));
        assert_eq!(rel.column_index("close"), None);
        assert!(rel.require_column("Open").is_err());
    }
}
