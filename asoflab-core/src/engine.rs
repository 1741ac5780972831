//! Query engine — the single entry point tying catalog, store and
//! strategies together.

use crate::catalog::{FieldCatalog, FieldKind, FieldSpec};
use crate::domain::normalize_tickers;
use crate::error::QueryError;
use crate::params::{FundamentalParams, Params, PricingParams, SeriesParams};
use crate::result::ResultTable;
use crate::store::TableStore;
use crate::strategies::{description, fundamental, series};
use chrono::NaiveDate;
use std::sync::Arc;

/// Immutable query context over loaded relations and the field catalog.
///
/// The engine holds `Arc`s so a reload builds a fresh context and swaps it
/// in whole; in-flight queries keep seeing the snapshot they started with.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<TableStore>,
    catalog: Arc<FieldCatalog>,
}

impl QueryEngine {
    pub fn new(store: TableStore, catalog: FieldCatalog) -> Self {
        Self {
            store: Arc::new(store),
            catalog: Arc::new(catalog),
        }
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Answer "what was `field` for `tickers`, as known on the as-of date".
    ///
    /// Tickers are upper-cased and de-duplicated first; the result row order
    /// follows that normalized order. The current local date stands in for
    /// any missing as-of parameter.
    pub fn get_data<S: AsRef<str>>(
        &self,
        tickers: &[S],
        field: &str,
        params: &Params,
    ) -> Result<ResultTable, QueryError> {
        self.get_data_at(tickers, field, params, chrono::Local::now().date_naive())
    }

    /// `get_data` with an explicit "today" for the as-of default.
    pub fn get_data_at<S: AsRef<str>>(
        &self,
        tickers: &[S],
        field: &str,
        params: &Params,
        today: NaiveDate,
    ) -> Result<ResultTable, QueryError> {
        let tickers = normalize_tickers(tickers);
        let spec = self.catalog.resolve(field)?;

        tracing::debug!(
            field = %spec.long_name,
            strategy = %spec.strategy(),
            tickers = tickers.len(),
            "dispatching query"
        );

        match &spec.kind {
            FieldKind::Description {
                relations,
                join_keys,
            } => description::retrieve(
                &self.store,
                relations,
                join_keys,
                &spec.long_name,
                &tickers,
            ),
            FieldKind::Pricing { relation } => {
                let params = PricingParams::from_params(params)?;
                series::retrieve_pricing(&self.store, relation, &spec.long_name, &tickers, &params)
            }
            FieldKind::MarketMetric { relation } => {
                let params = SeriesParams::from_params(params)?;
                series::retrieve_market(&self.store, relation, &spec.long_name, &tickers, &params)
            }
            FieldKind::Fundamental {
                quarterly,
                annual,
                ttm,
            } => {
                let params = FundamentalParams::from_params(params, today)?;
                let source = fundamental::FundamentalSource {
                    quarterly,
                    annual,
                    ttm,
                };
                fundamental::retrieve(&self.store, source, &spec.long_name, &tickers, &params)
            }
        }
    }

    /// Resolve a field alias to its catalog entry.
    pub fn field_info(&self, alias: &str) -> Result<&FieldSpec, QueryError> {
        self.catalog.resolve(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldSpec;
    use crate::domain::Value;
    use crate::store::Relation;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn engine() -> QueryEngine {
        let prices = Relation::new(
            "shareprices-daily",
            vec![
                "Ticker".to_string(),
                "Date".to_string(),
                "Close".to_string(),
                "Adj. Close".to_string(),
            ],
            vec![vec![
                "AAPL".into(),
                Value::Date(date("2023-01-02")),
                Value::Num(100.0),
                Value::Num(98.0),
            ]],
        )
        .unwrap();
        let catalog = FieldCatalog::new(vec![FieldSpec {
            long_name: "Close".to_string(),
            short_name: "px_close".to_string(),
            kind: FieldKind::Pricing {
                relation: "shareprices-daily".to_string(),
            },
            params_doc: String::new(),
            doc: String::new(),
        }]);
        QueryEngine::new(TableStore::with_relations([prices]), catalog)
    }

    #[test]
    fn dispatch_normalizes_tickers_and_resolves_aliases() {
        let engine = engine();
        let params = Params::new()
            .with("start", "2023-01-02")
            .with("end", "2023-01-02");
        let out = engine
            .get_data(&[" aapl ", "AAPL"], "px_close", &params)
            .unwrap();
        assert_eq!(out.index(), &["AAPL".to_string()]);
        assert_eq!(out.get(0, "Close"), Some(&Value::Num(98.0)));
    }

    #[test]
    fn unknown_field_is_fatal() {
        let engine = engine();
        assert_eq!(
            engine
                .get_data(&["AAPL"], "Revenue", &Params::new())
                .unwrap_err(),
            QueryError::FieldNotFound("Revenue".into())
        );
    }

    #[test]
    fn parameter_validation_precedes_data_access() {
        let engine = engine();
        // Missing 'end' fails before the store is touched.
        let params = Params::new().with("start", "2023-01-02");
        assert_eq!(
            engine.get_data(&["AAPL"], "Close", &params).unwrap_err(),
            QueryError::MissingRequiredParameter("end".into())
        );
    }
}
