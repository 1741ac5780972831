//! Point-in-time financial data queries.
//!
//! The engine answers one question: what was field F for tickers T, as known
//! on date D. Every retrieval path enforces the anti-look-ahead rule —
//! fundamental reports only become visible once their publish date has
//! passed the as-of date, and restatements supersede the originals without
//! erasing the history that earlier as-of dates still see.
//!
//! Layering, bottom up:
//!
//! - [`domain`]: the cell [`Value`] type, report rows, ticker normalization
//! - [`store`]: named immutable relations ([`TableStore`])
//! - [`catalog`]: field aliases and strategy metadata ([`FieldCatalog`])
//! - [`params`]: keyword-bag normalization into typed per-strategy configs
//! - `strategies`: description / pricing / market-metric / fundamental
//! - [`engine`]: the [`QueryEngine`] dispatcher tying it all together
//! - [`listing`]: universe helpers (active tickers, classifications)

pub mod calendar;
pub mod catalog;
pub mod domain;
pub mod engine;
pub mod error;
pub mod listing;
pub mod params;
pub mod result;
pub mod store;
pub mod strategies;

pub use catalog::{FieldCatalog, FieldKind, FieldSpec, Strategy};
pub use domain::{normalize_tickers, Value};
pub use engine::QueryEngine;
pub use error::QueryError;
pub use params::{ParamValue, Params};
pub use result::ResultTable;
pub use store::{Relation, RelationError, TableStore};
