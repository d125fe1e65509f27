//! Summary aggregation.
//!
//! Each directive (`"field:aggregation[:v1|v2]"`) runs as its own aggregate
//! query over the filtered rows, ignoring paging. Results merge into one flat
//! [`Summary`] map keyed `<field>_<suffix>`; a later directive producing the
//! same key overwrites the earlier value.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::query_builder::{AggregateFunc, Query};
use super::types::{Summary, SummaryValue};
use crate::error::{PaginationError, Result};
use crate::store::Store;

/// Number of buckets returned by a `top` directive.
pub const TOP_CATEGORIES: u64 = 5;

/// Aggregation kinds understood by [`SummaryEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Min,
    Max,
    Distribution,
    Top,
    ValueCount,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Distribution => "distribution",
            Aggregation::Top => "top",
            Aggregation::ValueCount => "value_count",
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "distribution" => Ok(Aggregation::Distribution),
            "top" => Ok(Aggregation::Top),
            "value_count" => Ok(Aggregation::ValueCount),
            other => Err(format!("unknown aggregation '{other}'")),
        }
    }
}

/// A parsed summary directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryDirective {
    /// Column the aggregate runs over.
    pub field: String,

    /// Aggregate to compute. Defaults to sum.
    pub aggregation: Aggregation,

    /// Literal values for `value_count`; empty counts every non-null row.
    pub values: Vec<String>,
}

impl SummaryDirective {
    pub fn new(field: impl Into<String>, aggregation: Aggregation) -> Self {
        Self {
            field: field.into(),
            aggregation,
            values: Vec::new(),
        }
    }

    /// Attach literal values (used by `value_count`).
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a list of directive strings, failing on the first bad one.
    pub fn parse_all<S: AsRef<str>>(directives: &[S]) -> Result<Vec<Self>> {
        directives.iter().map(|d| d.as_ref().parse()).collect()
    }
}

impl FromStr for SummaryDirective {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| PaginationError::InvalidSummaryDirective {
            directive: s.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.splitn(3, ':');
        let field = parts.next().unwrap_or_default().trim();
        if field.is_empty() {
            return Err(invalid("missing field"));
        }

        let aggregation = match parts.next().map(str::trim) {
            None | Some("") => Aggregation::Sum,
            Some(name) => name.parse::<Aggregation>().map_err(|e| invalid(&e))?,
        };

        let values = parts
            .next()
            .map(|list| {
                list.split('|')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            field: field.to_string(),
            aggregation,
            values,
        })
    }
}

impl fmt::Display for SummaryDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.aggregation.as_str())?;
        if !self.values.is_empty() {
            write!(f, ":{}", self.values.join("|"))?;
        }
        Ok(())
    }
}

/// Runs summary directives against a store.
pub struct SummaryEngine;

impl SummaryEngine {
    /// Execute every directive in order and merge the outputs.
    ///
    /// The first failing round trip aborts the run with a store error naming
    /// the directive.
    pub async fn run<S: Store>(
        store: &S,
        query: &Query,
        directives: &[SummaryDirective],
    ) -> Result<Summary> {
        let mut summary = Summary::new();

        for directive in directives {
            for (key, value) in Self::run_one(store, query, directive).await? {
                summary.insert(key, value);
            }
        }

        Ok(summary)
    }

    async fn run_one<S: Store>(
        store: &S,
        query: &Query,
        directive: &SummaryDirective,
    ) -> Result<Vec<(String, SummaryValue)>> {
        let dialect = store.dialect();
        let field = directive.field.as_str();
        let stage = || format!("summary '{directive}'");

        let numeric = |func: AggregateFunc| {
            query.build_aggregate(dialect, Query::float_aggregate(dialect, func, field))
        };

        let outputs = match directive.aggregation {
            Aggregation::Sum | Aggregation::Min | Aggregation::Max => {
                let (func, suffix) = match directive.aggregation {
                    Aggregation::Min => (AggregateFunc::Min, "min"),
                    Aggregation::Max => (AggregateFunc::Max, "max"),
                    _ => (AggregateFunc::Sum, "sum"),
                };
                let sql = numeric(func);
                debug!(sql = %sql, "summary aggregate");
                let value = store
                    .fetch_number(&sql)
                    .await
                    .map_err(|e| PaginationError::store(stage(), e))?;
                vec![(format!("{field}_{suffix}"), SummaryValue::Number(value))]
            }
            Aggregation::Distribution | Aggregation::Top => {
                let (sql, key) = if directive.aggregation == Aggregation::Top {
                    (
                        query.build_buckets(dialect, field, true, Some(TOP_CATEGORIES)),
                        format!("{field}_top_{TOP_CATEGORIES}_categories"),
                    )
                } else {
                    (
                        query.build_buckets(dialect, field, false, None),
                        format!("{field}_distribution"),
                    )
                };
                debug!(sql = %sql, "summary buckets");
                let buckets = store
                    .fetch_buckets(&sql)
                    .await
                    .map_err(|e| PaginationError::store(stage(), e))?;
                vec![(key, SummaryValue::Buckets(buckets))]
            }
            Aggregation::ValueCount if directive.values.is_empty() => {
                let sql = query.build_value_count(dialect, field, None);
                debug!(sql = %sql, "summary value count");
                let count = store
                    .fetch_count(&sql)
                    .await
                    .map_err(|e| PaginationError::store(stage(), e))?;
                vec![(format!("{field}_count"), SummaryValue::Count(count))]
            }
            Aggregation::ValueCount => {
                let mut outputs = Vec::with_capacity(directive.values.len());
                for value in &directive.values {
                    let sql = query.build_value_count(dialect, field, Some(value));
                    debug!(sql = %sql, "summary value count");
                    let count = store
                        .fetch_count(&sql)
                        .await
                        .map_err(|e| PaginationError::store(stage(), e))?;
                    outputs.push((format!("{field}_{value}_count"), SummaryValue::Count(count)));
                }
                outputs
            }
        };

        Ok(outputs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_directive_with_aggregation() {
        let directive: SummaryDirective = "trx_amount:max".parse().unwrap();
        assert_eq!(directive.field, "trx_amount");
        assert_eq!(directive.aggregation, Aggregation::Max);
        assert!(directive.values.is_empty());
    }

    #[test]
    fn missing_aggregation_defaults_to_sum() {
        let directive: SummaryDirective = "trx_amount".parse().unwrap();
        assert_eq!(directive.aggregation, Aggregation::Sum);

        let directive: SummaryDirective = "trx_amount:".parse().unwrap();
        assert_eq!(directive.aggregation, Aggregation::Sum);
    }

    #[test]
    fn parse_value_count_values() {
        let directive: SummaryDirective = "trx_type:value_count:income|expense".parse().unwrap();
        assert_eq!(directive.aggregation, Aggregation::ValueCount);
        assert_eq!(directive.values, vec!["income", "expense"]);

        let directive: SummaryDirective = "trx_type:value_count:income||".parse().unwrap();
        assert_eq!(directive.values, vec!["income"]);
    }

    #[test]
    fn rejects_bad_directives() {
        let err = "trx_amount:median".parse::<SummaryDirective>().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("median"), "{err}");

        assert!(":sum".parse::<SummaryDirective>().is_err());
        assert!("".parse::<SummaryDirective>().is_err());
    }

    #[test]
    fn parse_all_stops_at_first_error() {
        let ok = SummaryDirective::parse_all(&["a:sum", "b:top"]).unwrap();
        assert_eq!(ok.len(), 2);

        assert!(SummaryDirective::parse_all(&["a:sum", "b:bogus"]).is_err());
    }

    #[test]
    fn directive_display() {
        let directive = SummaryDirective::new("trx_type", Aggregation::ValueCount)
            .with_values(["income", "expense"]);
        assert_eq!(directive.to_string(), "trx_type:value_count:income|expense");
        assert_eq!(
            SummaryDirective::new("x", Aggregation::Distribution).to_string(),
            "x:distribution"
        );
    }
}
