//! Keyword parameter normalization and typed per-strategy configs.
//!
//! Queries arrive with a free-form keyword bag. Names are matched
//! case-insensitively after trimming, the first match wins on duplicates,
//! string values are lower-cased, and date values are canonicalized to
//! `NaiveDate` — load-bearing, since every later comparison against relation
//! date columns assumes that canonical form. The typed configs below are
//! validated eagerly at the dispatcher boundary, before any data is touched.

use crate::error::QueryError;
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single keyword parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Date(NaiveDate),
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(d: NaiveDate) -> Self {
        ParamValue::Date(d)
    }
}

/// Order-preserving keyword parameter bag.
#[derive(Debug, Default, Clone)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive, trimmed lookup. First match wins on duplicates.
    fn lookup(&self, name: &str) -> Option<&ParamValue> {
        let wanted = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| k.trim().to_lowercase() == wanted)
            .map(|(_, v)| v)
    }

    fn required(&self, name: &str) -> Result<&ParamValue, QueryError> {
        self.lookup(name)
            .ok_or_else(|| QueryError::MissingRequiredParameter(name.to_string()))
    }

    /// A string parameter, lower-cased. `None` default makes it required.
    pub fn get_str(&self, name: &str, default: Option<&str>) -> Result<String, QueryError> {
        match self.lookup(name) {
            Some(ParamValue::Str(s)) => Ok(s.trim().to_lowercase()),
            Some(other) => Err(invalid(name, "a string", other)),
            None => match default {
                Some(d) => Ok(d.to_string()),
                None => Err(QueryError::MissingRequiredParameter(name.to_string())),
            },
        }
    }

    /// A y/n flag parameter.
    pub fn get_flag(&self, name: &str, default: bool) -> Result<bool, QueryError> {
        match self.lookup(name) {
            Some(ParamValue::Str(s)) => match s.trim().to_lowercase().as_str() {
                "y" => Ok(true),
                "n" => Ok(false),
                _ => Err(invalid(name, "'y' or 'n'", &ParamValue::Str(s.clone()))),
            },
            Some(other) => Err(invalid(name, "'y' or 'n'", other)),
            None => Ok(default),
        }
    }

    /// An integer parameter. Strings are parsed for callers that pass
    /// everything as text.
    pub fn get_int(&self, name: &str, default: Option<i64>) -> Result<i64, QueryError> {
        match self.get_int_opt(name)? {
            Some(v) => Ok(v),
            None => default.ok_or_else(|| QueryError::MissingRequiredParameter(name.to_string())),
        }
    }

    /// An optional integer with no default: absent is simply `None`.
    pub fn get_int_opt(&self, name: &str) -> Result<Option<i64>, QueryError> {
        match self.lookup(name) {
            Some(ParamValue::Int(i)) => Ok(Some(*i)),
            Some(ParamValue::Str(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid(name, "an integer", &ParamValue::Str(s.clone()))),
            Some(other) => Err(invalid(name, "an integer", other)),
            None => Ok(None),
        }
    }

    /// A calendar-date parameter. Accepts a date value or an ISO-8601
    /// `YYYY-MM-DD` string; the result is always a canonical `NaiveDate`.
    pub fn get_date(&self, name: &str, default: Option<NaiveDate>) -> Result<NaiveDate, QueryError> {
        match self.lookup(name) {
            Some(value) => parse_date(name, value),
            None => default.ok_or_else(|| QueryError::MissingRequiredParameter(name.to_string())),
        }
    }

    /// A required calendar-date parameter.
    pub fn get_date_required(&self, name: &str) -> Result<NaiveDate, QueryError> {
        let value = self.required(name)?;
        parse_date(name, value)
    }
}

fn parse_date(name: &str, value: &ParamValue) -> Result<NaiveDate, QueryError> {
    match value {
        ParamValue::Date(d) => Ok(*d),
        ParamValue::Str(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|_| invalid(name, "a YYYY-MM-DD date", value)),
        ParamValue::Int(_) => Err(invalid(name, "a YYYY-MM-DD date", value)),
    }
}

fn invalid(name: &str, expected: &'static str, got: &ParamValue) -> QueryError {
    let got = match got {
        ParamValue::Str(s) => s.clone(),
        ParamValue::Int(i) => i.to_string(),
        ParamValue::Date(d) => d.to_string(),
    };
    QueryError::InvalidParameterValue {
        name: name.to_string(),
        expected,
        got,
    }
}

// ─── Typed per-strategy configs ──────────────────────────────────────

/// Parameters shared by the pricing and market-metric strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Forward-fill gaps, seeding the fill from a 10-day pre-window.
    pub fill_prev: bool,
}

impl SeriesParams {
    pub fn from_params(params: &Params) -> Result<Self, QueryError> {
        let start = params.get_date_required("start")?;
        let end = params.get_date_required("end")?;
        if start > end {
            return Err(QueryError::InvalidDateRange { start, end });
        }
        Ok(Self {
            start,
            end,
            fill_prev: params.get_flag("fill_prev", false)?,
        })
    }
}

/// Pricing adds split/dividend adjustment on top of the shared series
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingParams {
    pub series: SeriesParams,
    /// Adjust the raw value by `(Adj. Close - Close)` per row, default on.
    pub adjust: bool,
}

impl PricingParams {
    pub fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            series: SeriesParams::from_params(params)?,
            adjust: params.get_flag("adj", true)?,
        })
    }
}

/// Fundamental period type (`pt` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodType {
    Quarterly,
    Annual,
    Ttm,
}

impl PeriodType {
    fn parse(params: &Params) -> Result<Self, QueryError> {
        let raw = params.get_str("pt", Some("ttm"))?;
        match raw.as_str() {
            "q" => Ok(PeriodType::Quarterly),
            "a" => Ok(PeriodType::Annual),
            "ttm" => Ok(PeriodType::Ttm),
            _ => Err(QueryError::InvalidParameterValue {
                name: "pt".to_string(),
                expected: "'q', 'a' or 'ttm'",
                got: raw,
            }),
        }
    }
}

/// How the fundamental strategy addresses reports: relative to the latest
/// known report, or by absolute fiscal period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodAddress {
    /// Positions relative to the latest known report (0 = latest,
    /// -1 = one before). `start == end` selects exactly one report.
    Offset { start: i64, end: i64 },
    /// Inclusive fiscal-year bounds, plus fiscal-quarter bounds for
    /// quarterly/TTM period types.
    Absolute {
        year_start: i64,
        year_end: i64,
        quarters: Option<(i64, i64)>,
    },
}

/// Validated fundamental query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalParams {
    pub period_type: PeriodType,
    pub address: PeriodAddress,
    pub as_of_start: NaiveDate,
    pub as_of_end: NaiveDate,
}

impl FundamentalParams {
    /// Extract and validate all fundamental parameters.
    ///
    /// `today` is the default as-of date when the caller gives none.
    /// Failure policy: start > end is `InvalidDateRange`; partial absolute
    /// bounds are `IncompleteRangeParameters` (never silently defaulted);
    /// absolute bounds with an as-of range are `IncompatibleParameters`.
    pub fn from_params(params: &Params, today: NaiveDate) -> Result<Self, QueryError> {
        let period_type = PeriodType::parse(params)?;

        let as_of_start = params.get_date("as_of_date_start", Some(today))?;
        let as_of_end = params.get_date("as_of_date_end", Some(today))?;
        if as_of_start > as_of_end {
            return Err(QueryError::InvalidDateRange {
                start: as_of_start,
                end: as_of_end,
            });
        }
        let is_range = as_of_start < as_of_end;

        let y_start = params.get_int_opt("y_start")?;
        let y_end = params.get_int_opt("y_end")?;
        let q_start = params.get_int_opt("q_start")?;
        let q_end = params.get_int_opt("q_end")?;

        // Quarter bounds only apply to quarterly/TTM period types; for
        // annual data they are ignored, matching the original behavior.
        let absolute = match period_type {
            PeriodType::Quarterly | PeriodType::Ttm => {
                let given = [y_start, y_end, q_start, q_end];
                if given.iter().any(Option::is_some) {
                    if given.iter().all(Option::is_some) {
                        Some(PeriodAddress::Absolute {
                            year_start: y_start.unwrap(),
                            year_end: y_end.unwrap(),
                            quarters: Some((q_start.unwrap(), q_end.unwrap())),
                        })
                    } else {
                        return Err(QueryError::IncompleteRangeParameters);
                    }
                } else {
                    None
                }
            }
            PeriodType::Annual => match (y_start, y_end) {
                (Some(ys), Some(ye)) => Some(PeriodAddress::Absolute {
                    year_start: ys,
                    year_end: ye,
                    quarters: None,
                }),
                (None, None) => None,
                _ => return Err(QueryError::IncompleteRangeParameters),
            },
        };

        let address = match absolute {
            Some(addr) => {
                if is_range {
                    return Err(QueryError::IncompatibleParameters);
                }
                addr
            }
            None => PeriodAddress::Offset {
                start: params.get_int("offset_start", Some(0))?,
                end: params.get_int("offset_end", Some(0))?,
            },
        };

        Ok(Self {
            period_type,
            address,
            as_of_start,
            as_of_end,
        })
    }

    /// Whether this query sweeps an as-of date range (offset mode only).
    pub fn is_range(&self) -> bool {
        self.as_of_start < self.as_of_end
    }
}
