//! Pagination engine types.
//!
//! Provides type definitions shared across the engine:
//! - PaginatorOptions: the per-request options bag
//! - FilterValue / ComparisonOperator / SortDirection: filter and sort vocabulary
//! - PageResult / SummaryValue / Bucket: what a paginate call returns

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::filter::Filter;
use super::ordering::Ordering;
use crate::error::PaginationError;

/// Per-request pagination options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatorOptions {
    /// Page number, 1-indexed.
    #[serde(default = "default_page")]
    pub page: u32,

    /// Rows per page. `None` falls back to the configured default.
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Literal sort expressions (`"trx_amount desc"`), applied after orderings.
    #[serde(default)]
    pub sort: Vec<String>,

    /// Filters AND-ed onto the query.
    #[serde(default)]
    pub filters: Vec<Filter>,

    /// GROUP BY columns.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Summary directives (`"field:aggregation[:v1|v2]"`).
    #[serde(default)]
    pub summary_fields: Vec<String>,

    /// Typed sort terms.
    #[serde(default)]
    pub orderings: Vec<Ordering>,
}

fn default_page() -> u32 {
    1
}

impl Default for PaginatorOptions {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: None,
            sort: Vec::new(),
            filters: Vec::new(),
            groups: Vec::new(),
            summary_fields: Vec::new(),
            orderings: Vec::new(),
        }
    }
}

impl PaginatorOptions {
    /// Create options with defaults (page 1, configured page size).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page. Zero is ignored.
    pub fn page(mut self, page: u32) -> Self {
        if page > 0 {
            self.page = page;
        } else {
            tracing::debug!(page, "ignoring out-of-range page option");
        }
        self
    }

    /// Set the page size. Zero is ignored.
    pub fn page_size(mut self, page_size: u32) -> Self {
        if page_size > 0 {
            self.page_size = Some(page_size);
        } else {
            tracing::debug!(page_size, "ignoring out-of-range page size option");
        }
        self
    }

    /// Replace the literal sort expressions.
    pub fn sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = sort.into_iter().map(Into::into).collect();
        self
    }

    /// Append filters.
    pub fn filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = Filter>,
    {
        self.filters.extend(filters);
        self
    }

    /// Append GROUP BY columns.
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Replace the summary directives.
    pub fn summary_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.summary_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append typed orderings.
    pub fn orderings<I>(mut self, orderings: I) -> Self
    where
        I: IntoIterator<Item = Ordering>,
    {
        self.orderings.extend(orderings);
        self
    }
}

/// Comparison operators for [`Filter::Comparison`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComparisonOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
}

impl ComparisonOperator {
    /// SQL spelling of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Gte => ">=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Lte => "<=",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOperator {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" | "eq" => Ok(ComparisonOperator::Eq),
            "!=" | "<>" | "ne" => Ok(ComparisonOperator::Ne),
            ">" | "gt" => Ok(ComparisonOperator::Gt),
            ">=" | "gte" => Ok(ComparisonOperator::Gte),
            "<" | "lt" => Ok(ComparisonOperator::Lt),
            "<=" | "lte" => Ok(ComparisonOperator::Lte),
            _ => Err(PaginationError::InvalidOperator(s.to_string())),
        }
    }
}

/// Filter value types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    /// String value.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Float value.
    Float(f64),
    /// Boolean value.
    Boolean(bool),
    /// UUID value.
    Uuid(Uuid),
}

impl FilterValue {
    /// Convert to a bindable SQL value.
    pub fn to_sql_value(&self) -> sea_query::Value {
        match self {
            FilterValue::String(s) => s.clone().into(),
            FilterValue::Integer(i) => (*i).into(),
            FilterValue::Float(f) => (*f).into(),
            FilterValue::Boolean(b) => (*b).into(),
            FilterValue::Uuid(u) => (*u).into(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(i64::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Uuid(value)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(PaginationError::InvalidDirection(s.to_string()))
        }
    }
}

/// One `(value, count)` pair of a distribution or top-N summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bucket {
    /// Grouped column value.
    pub value: serde_json::Value,

    /// Number of rows holding that value.
    pub count: i64,
}

/// A single summary output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SummaryValue {
    /// Row counts (`value_count`).
    Count(i64),
    /// Numeric aggregates (`sum`, `min`, `max`). `None` when no rows matched.
    Number(Option<f64>),
    /// Grouped counts (`distribution`, `top`).
    Buckets(Vec<Bucket>),
}

impl SummaryValue {
    /// Numeric value, if this is a non-null number or a count.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SummaryValue::Number(n) => *n,
            SummaryValue::Count(c) => Some(*c as f64),
            SummaryValue::Buckets(_) => None,
        }
    }

    /// Count value, if this is a count.
    pub fn as_count(&self) -> Option<i64> {
        match self {
            SummaryValue::Count(c) => Some(*c),
            _ => None,
        }
    }

    /// Buckets, if this is a distribution.
    pub fn as_buckets(&self) -> Option<&[Bucket]> {
        match self {
            SummaryValue::Buckets(b) => Some(b),
            _ => None,
        }
    }
}

/// Summary output keyed by `<field>_<aggregation>`.
pub type Summary = BTreeMap<String, SummaryValue>;

/// Result of a paginate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// Rows of the requested page.
    pub data: Vec<T>,

    /// Total rows matching the filters (before paging).
    pub total: u64,

    /// Current page number (1-indexed).
    pub page: u32,

    /// Rows per page.
    pub page_size: u32,

    /// Total number of pages.
    pub total_pages: u32,

    /// Whether there's a next page.
    pub has_next: bool,

    /// Whether there's a previous page.
    pub has_prev: bool,

    /// Summary statistics, present only when directives were given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl<T> PageResult<T> {
    /// Create a new result with paging calculations.
    pub fn new(data: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        let total_pages = total_pages(total, page_size);

        Self {
            data,
            total,
            page,
            page_size,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
            summary: None,
        }
    }

    /// Attach summary statistics.
    pub fn with_summary(mut self, summary: Option<Summary>) -> Self {
        self.summary = summary;
        self
    }
}

/// `ceil(total / page_size)`; zero rows is zero pages.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if total == 0 || page_size == 0 {
        return 0;
    }
    let page_size = u64::from(page_size);
    let pages = total.div_ceil(page_size);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn options_defaults() {
        let options = PaginatorOptions::default();
        assert_eq!(options.page, 1);
        assert_eq!(options.page_size, None);
        assert!(options.filters.is_empty());
        assert!(options.summary_fields.is_empty());
    }

    #[test]
    fn options_ignore_zero() {
        let options = PaginatorOptions::new().page(3).page_size(25).page(0).page_size(0);
        assert_eq!(options.page, 3);
        assert_eq!(options.page_size, Some(25));
    }

    #[test]
    fn options_sort_replaces_groups_append() {
        let options = PaginatorOptions::new()
            .sort(["a asc"])
            .sort(["b desc"])
            .groups(["x"])
            .groups(["y"]);
        assert_eq!(options.sort, vec!["b desc".to_string()]);
        assert_eq!(options.groups, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn options_deserialize_camel_case() {
        let json = r#"{
            "page": 2,
            "pageSize": 5,
            "summaryFields": ["trx_amount:sum"],
            "filters": [{"type": "search", "field": "cif", "value": "ABC"}],
            "orderings": [{"field": "trx_date", "direction": "desc"}]
        }"#;
        let options: PaginatorOptions = serde_json::from_str(json).unwrap();

        assert_eq!(options.page, 2);
        assert_eq!(options.page_size, Some(5));
        assert_eq!(options.summary_fields, vec!["trx_amount:sum".to_string()]);
        assert_eq!(options.filters.len(), 1);
        assert_eq!(options.orderings[0].direction, SortDirection::Desc);
    }

    #[test]
    fn comparison_operator_parsing() {
        assert_eq!(">=".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::Gte);
        assert_eq!("<>".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::Ne);
        assert_eq!("LT".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::Lt);
        assert!("~".parse::<ComparisonOperator>().is_err());
    }

    #[test]
    fn comparison_operator_serialization() {
        let json = serde_json::to_string(&ComparisonOperator::Gte).unwrap();
        assert_eq!(json, "\">=\"");
        let parsed: ComparisonOperator = serde_json::from_str("\"!=\"").unwrap();
        assert_eq!(parsed, ComparisonOperator::Ne);
    }

    #[test]
    fn sort_direction_parsing() {
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn filter_value_conversions() {
        assert_eq!(FilterValue::from("income"), FilterValue::String("income".into()));
        assert_eq!(FilterValue::from(42), FilterValue::Integer(42));
        assert_eq!(FilterValue::from(true), FilterValue::Boolean(true));

        let parsed: FilterValue = serde_json::from_str("150.5").unwrap();
        assert_eq!(parsed, FilterValue::Float(150.5));
    }

    #[test]
    fn total_pages_ceiling() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(3, 2), 2);
    }

    #[test]
    fn page_result_paging() {
        let result = PageResult::new(vec![1, 2, 3], 25, 2, 10);

        assert_eq!(result.total, 25);
        assert_eq!(result.total_pages, 3);
        assert!(result.has_next);
        assert!(result.has_prev);
    }

    #[test]
    fn page_result_empty() {
        let result: PageResult<i32> = PageResult::new(vec![], 0, 1, 10);

        assert_eq!(result.total_pages, 0);
        assert!(!result.has_next);
        assert!(!result.has_prev);
    }

    #[test]
    fn page_result_serialization_omits_missing_summary() {
        let result = PageResult::new(vec![serde_json::json!({"id": 1})], 1, 1, 10);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["totalPages"], 1);
        assert!(json.get("summary").is_none());

        let mut summary = Summary::new();
        summary.insert("amount_sum".to_string(), SummaryValue::Number(Some(600.0)));
        let json = serde_json::to_value(result.with_summary(Some(summary))).unwrap();
        assert_eq!(json["summary"]["amount_sum"], 600.0);
    }

    #[test]
    fn summary_value_accessors() {
        assert_eq!(SummaryValue::Number(Some(1.5)).as_f64(), Some(1.5));
        assert_eq!(SummaryValue::Number(None).as_f64(), None);
        assert_eq!(SummaryValue::Count(4).as_count(), Some(4));
        assert!(SummaryValue::Buckets(vec![]).as_buckets().is_some());
    }
}
