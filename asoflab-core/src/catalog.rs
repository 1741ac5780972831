//! Field catalog — alias resolution and field metadata.
//!
//! A field is addressed by its long or short name (case-insensitive exact
//! match). The metadata carries the retrieval strategy and the typed source
//! declaration the strategy reads from, so a field spec can never pair a
//! strategy with a source shape it cannot use.

use crate::error::QueryError;
use std::fmt;

/// The closed set of retrieval strategies.
///
/// Dispatch is an exhaustive match; an unrecognized tag can only appear at
/// the catalog-loading edge, where `Strategy::parse` rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Description,
    Pricing,
    MarketMetric,
    Fundamental,
}

impl Strategy {
    /// Parse a catalog strategy tag. Unknown tags indicate catalog
    /// inconsistency and are fatal.
    pub fn parse(tag: &str) -> Result<Self, QueryError> {
        match tag.trim().to_lowercase().as_str() {
            "description" => Ok(Strategy::Description),
            "pricing" => Ok(Strategy::Pricing),
            "market" | "market_metric" => Ok(Strategy::MarketMetric),
            "fundamental" => Ok(Strategy::Fundamental),
            other => Err(QueryError::UnknownStrategy(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Description => "description",
            Strategy::Pricing => "pricing",
            Strategy::MarketMetric => "market",
            Strategy::Fundamental => "fundamental",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strategy tag plus its source declaration, fused so that mismatches are
/// unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// One static column, reached through an optional left-join chain:
    /// `relations[0]` is the base; `relations[i]` joins on `join_keys[i-1]`.
    Description {
        relations: Vec<String>,
        join_keys: Vec<String>,
    },
    /// A dated price column with split/dividend adjustment support.
    Pricing { relation: String },
    /// A dated market metric column (no adjustment).
    MarketMetric { relation: String },
    /// Fundamental reports, one relation per period type.
    Fundamental {
        quarterly: String,
        annual: String,
        ttm: String,
    },
}

impl FieldKind {
    pub fn strategy(&self) -> Strategy {
        match self {
            FieldKind::Description { .. } => Strategy::Description,
            FieldKind::Pricing { .. } => Strategy::Pricing,
            FieldKind::MarketMetric { .. } => Strategy::MarketMetric,
            FieldKind::Fundamental { .. } => Strategy::Fundamental,
        }
    }
}

/// Metadata for one queryable field.
///
/// The long name doubles as the value column name in the source relation(s).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub long_name: String,
    pub short_name: String,
    pub kind: FieldKind,
    /// Human-readable parameter documentation for the field's strategy.
    pub params_doc: String,
    /// One-line description shown by field listings.
    pub doc: String,
}

impl FieldSpec {
    pub fn strategy(&self) -> Strategy {
        self.kind.strategy()
    }

    fn matches_exact(&self, needle: &str) -> bool {
        self.long_name.to_lowercase() == needle || self.short_name.to_lowercase() == needle
    }

    fn matches_keyword(&self, needle: &str) -> bool {
        self.long_name.to_lowercase().contains(needle)
            || self.short_name.to_lowercase().contains(needle)
    }
}

/// All field specs, looked up by alias. Immutable after construction.
#[derive(Debug, Default, Clone)]
pub struct FieldCatalog {
    fields: Vec<FieldSpec>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Resolve an alias to its field spec.
    ///
    /// The alias is trimmed and matched case-insensitively against long and
    /// short names; anything but exactly one match is `FieldNotFound`.
    pub fn resolve(&self, alias: &str) -> Result<&FieldSpec, QueryError> {
        let needle = alias.trim().to_lowercase();
        let mut matches = self.fields.iter().filter(|f| f.matches_exact(&needle));

        match (matches.next(), matches.next()) {
            (Some(spec), None) => Ok(spec),
            _ => Err(QueryError::FieldNotFound(alias.trim().to_string())),
        }
    }

    /// Full field listing, in catalog order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Distinct data categories (strategy names) present in the catalog.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        for f in &self.fields {
            let name = f.strategy().name();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    /// Fields belonging to any of the given categories (case-insensitive).
    pub fn fields_by_category(&self, categories: &[&str]) -> Vec<&FieldSpec> {
        let wanted: Vec<String> = categories.iter().map(|c| c.trim().to_lowercase()).collect();
        self.fields
            .iter()
            .filter(|f| wanted.iter().any(|w| w == f.strategy().name()))
            .collect()
    }

    /// Fields whose long or short name contains the keyword
    /// (case-insensitive substring).
    pub fn search(&self, keyword: &str) -> Vec<&FieldSpec> {
        let needle = keyword.trim().to_lowercase();
        self.fields
            .iter()
            .filter(|f| f.matches_keyword(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(long: &str, short: &str, kind: FieldKind) -> FieldSpec {
        FieldSpec {
            long_name: long.to_string(),
            short_name: short.to_string(),
            kind,
            params_doc: String::new(),
            doc: String::new(),
        }
    }

    fn catalog() -> FieldCatalog {
        FieldCatalog::new(vec![
            spec(
                "Close",
                "px_close",
                FieldKind::Pricing {
                    relation: "shareprices-daily".into(),
                },
            ),
            spec(
                "Revenue",
                "rev",
                FieldKind::Fundamental {
                    quarterly: "income-quarterly".into(),
                    annual: "income-annual".into(),
                    ttm: "income-ttm".into(),
                },
            ),
            spec(
                "Company Name",
                "name",
                FieldKind::Description {
                    relations: vec!["companies".into()],
                    join_keys: vec![],
                },
            ),
        ])
    }

    #[test]
    fn resolve_by_long_or_short_name_case_insensitive() {
        let c = catalog();
        assert_eq!(c.resolve("close").unwrap().long_name, "Close");
        assert_eq!(c.resolve(" REV ").unwrap().long_name, "Revenue");
    }

    #[test]
    fn resolve_fails_on_zero_matches() {
        let c = catalog();
        assert_eq!(
            c.resolve("nope").unwrap_err(),
            QueryError::FieldNotFound("nope".into())
        );
    }

    #[test]
    fn resolve_fails_on_multiple_matches() {
        let mut fields = catalog().fields().to_vec();
        fields.push(spec(
            "Close",
            "px_close2",
            FieldKind::MarketMetric {
                relation: "other".into(),
            },
        ));
        let c = FieldCatalog::new(fields);
        assert!(matches!(
            c.resolve("Close"),
            Err(QueryError::FieldNotFound(_))
        ));
    }

    #[test]
    fn substring_match_is_not_resolution() {
        let c = catalog();
        // "Name" is a substring of "Company Name" but not an exact alias.
        assert!(c.resolve("Company").is_err());
        assert_eq!(c.search("comp").len(), 1);
    }

    #[test]
    fn unknown_strategy_tag_is_fatal() {
        assert_eq!(
            Strategy::parse("technical").unwrap_err(),
            QueryError::UnknownStrategy("technical".into())
        );
        assert_eq!(Strategy::parse(" Market ").unwrap(), Strategy::MarketMetric);
    }

    #[test]
    fn categories_are_distinct_in_catalog_order() {
        assert_eq!(
            catalog().categories(),
            vec!["pricing", "fundamental", "description"]
        );
        assert_eq!(catalog().fields_by_category(&["Fundamental"]).len(), 1);
    }
}
