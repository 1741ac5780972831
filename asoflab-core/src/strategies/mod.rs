//! Retrieval strategies — each maps (tickers, field metadata, parameters)
//! to a result table.
//!
//! - `description`: one static column via an optional left-join chain
//! - `series`: dated pricing / market-metric columns with calendar expansion
//! - `fundamental`: point-in-time report resolution (the core of the core)

pub mod description;
pub mod fundamental;
pub mod series;
