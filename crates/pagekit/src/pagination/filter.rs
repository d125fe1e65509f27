//! Row filters and AND/OR filter composition.

use sea_query::{Alias, Expr, LikeExpr, SimpleExpr};
use serde::{Deserialize, Serialize};

use super::query_builder::{LIKE_ESCAPE, Query, escape_like_wildcards};
use super::types::{ComparisonOperator, FilterValue};

/// A predicate that narrows a query.
///
/// Every variant renders to a standalone predicate, so any filter can sit in
/// either the AND or the OR group of a [`FilterManager`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// `field BETWEEN start AND end` (inclusive).
    DateRange {
        field: String,
        start: String,
        end: String,
    },
    /// `field <operator> value`.
    Comparison {
        field: String,
        operator: ComparisonOperator,
        value: FilterValue,
    },
    /// `field IN (statuses...)`. An empty set matches nothing.
    Status { field: String, statuses: Vec<String> },
    /// `field LIKE %value%` with wildcards in `value` escaped.
    Search { field: String, value: String },
}

impl Filter {
    /// Date range filter.
    pub fn date_range(
        field: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Filter::DateRange {
            field: field.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    /// Comparison filter.
    pub fn comparison(
        field: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Filter::Comparison {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Equality filter, shorthand for a `=` comparison.
    pub fn equals(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::comparison(field, ComparisonOperator::Eq, value)
    }

    /// Membership filter.
    pub fn status<I, S>(field: impl Into<String>, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Status {
            field: field.into(),
            statuses: statuses.into_iter().map(Into::into).collect(),
        }
    }

    /// Substring filter.
    pub fn search(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Search {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Column the filter applies to.
    pub fn field(&self) -> &str {
        match self {
            Filter::DateRange { field, .. }
            | Filter::Comparison { field, .. }
            | Filter::Status { field, .. }
            | Filter::Search { field, .. } => field,
        }
    }

    /// Render the filter as a detachable predicate.
    pub fn condition(&self) -> SimpleExpr {
        let column = Expr::col(Alias::new(self.field()));

        match self {
            Filter::DateRange { start, end, .. } => column.between(start.as_str(), end.as_str()),
            Filter::Comparison {
                operator, value, ..
            } => {
                let value = value.to_sql_value();
                match operator {
                    ComparisonOperator::Eq => column.eq(value),
                    ComparisonOperator::Ne => column.ne(value),
                    ComparisonOperator::Gt => column.gt(value),
                    ComparisonOperator::Gte => column.gte(value),
                    ComparisonOperator::Lt => column.lt(value),
                    ComparisonOperator::Lte => column.lte(value),
                }
            }
            Filter::Status { statuses, .. } => {
                if statuses.is_empty() {
                    // IN () is not valid SQL; an empty set matches no row
                    Expr::cust("1 = 0")
                } else {
                    column.is_in(statuses.iter().map(String::as_str))
                }
            }
            Filter::Search { value, .. } => column.like(
                LikeExpr::new(format!("%{}%", escape_like_wildcards(value))).escape(LIKE_ESCAPE),
            ),
        }
    }

    /// AND the filter onto a query.
    pub fn apply(&self, query: Query) -> Query {
        query.and_where(self.condition())
    }
}

/// Combines filters: AND filters narrow the query one by one, OR filters are
/// joined into one disjunction that is AND-ed on once.
#[derive(Debug, Clone, Default)]
pub struct FilterManager {
    and_filters: Vec<Filter>,
    or_filters: Vec<Filter>,
}

impl FilterManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter that every row must match.
    pub fn add_and_filter(&mut self, filter: Filter) -> &mut Self {
        self.and_filters.push(filter);
        self
    }

    /// Add a filter to the OR group.
    pub fn add_or_filter(&mut self, filter: Filter) -> &mut Self {
        self.or_filters.push(filter);
        self
    }

    /// AND filters in insertion order.
    pub fn and_filters(&self) -> &[Filter] {
        &self.and_filters
    }

    /// OR filters in insertion order.
    pub fn or_filters(&self) -> &[Filter] {
        &self.or_filters
    }

    /// Whether no filters have been added.
    pub fn is_empty(&self) -> bool {
        self.and_filters.is_empty() && self.or_filters.is_empty()
    }

    /// Apply all filters to a query. With no filters the query is returned
    /// unchanged.
    pub fn apply(self, query: Query) -> Query {
        tracing::debug!(
            table = query.table_name(),
            and_filters = self.and_filters.len(),
            or_filters = self.or_filters.len(),
            "applying filters"
        );

        let query = self
            .and_filters
            .iter()
            .fold(query, |query, filter| filter.apply(query));

        query.and_any(self.or_filters.iter().map(Filter::condition).collect())
    }
}
