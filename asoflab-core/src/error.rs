//! Query failure taxonomy.
//!
//! Every failure is surfaced synchronously as a typed error. Queries perform
//! no I/O, so there is no transient class and nothing is retried. A requested
//! ticker with no data is NOT an error — the fundamental strategy represents
//! it as an all-null row, which distinguishes "no data for this ticker" from
//! "malformed query".

use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by the query engine and its collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Zero or multiple case-insensitive exact matches in the field catalog.
    #[error("could not find exact matching field for '{0}'")]
    FieldNotFound(String),

    /// A required keyword parameter was absent and no default was given.
    #[error("'{0}=' is a required parameter")]
    MissingRequiredParameter(String),

    /// A parameter was present but could not be read as the expected type.
    #[error("parameter '{name}' must be {expected}, got '{got}'")]
    InvalidParameterValue {
        name: String,
        expected: &'static str,
        got: String,
    },

    /// The start as-of date lies after the end as-of date.
    #[error("the start as-of date {start} is after the end as-of date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Some but not all absolute fiscal-period bounds were given.
    #[error("missing start/end year or quarter: absolute-period bounds must be given together")]
    IncompleteRangeParameters,

    /// Absolute fiscal-period bounds combined with an as-of date range.
    #[error("an as-of date range can only be used with offset periods")]
    IncompatibleParameters,

    /// No publish events fall inside the requested as-of date range.
    #[error("no publish events between {start} and {end} for the requested tickers")]
    NoSufficientData { start: NaiveDate, end: NaiveDate },

    /// The field catalog declares a relation the table store does not hold.
    /// Fatal: indicates store/catalog inconsistency, not a bad query.
    #[error("relation '{0}' not found in the table store")]
    RelationNotFound(String),

    /// An unrecognized retrieval strategy tag. Fatal: catalog inconsistency.
    #[error("unknown retrieval strategy tag '{0}'")]
    UnknownStrategy(String),

    /// A relation is missing a column a strategy needs. Fatal: the loaded
    /// data does not match the shape the catalog promised.
    #[error("relation '{relation}' has no column '{column}'")]
    ColumnNotFound { relation: String, column: String },
}
