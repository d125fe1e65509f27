//! Pagination engine.
//!
//! This module provides:
//! - Filter / FilterManager: AND/OR predicate composition
//! - Ordering / RawSort: typed and literal sort terms
//! - SummaryEngine: per-directive aggregate queries
//! - Paginator: the request pipeline tying them together
//! - Query: SeaQuery-based SQL generation

pub mod filter;
pub mod ordering;
pub mod paginator;
pub mod query_builder;
pub mod summary;
pub mod types;

pub use filter::{Filter, FilterManager};
pub use ordering::{Ordering, RawSort};
pub use paginator::{Paginator, Prefetch};
pub use query_builder::{AggregateFunc, Query};
pub use summary::{Aggregation, SummaryDirective, SummaryEngine, TOP_CATEGORIES};
pub use types::{
    Bucket, ComparisonOperator, FilterValue, PageResult, PaginatorOptions, SortDirection, Summary,
    SummaryValue, total_pages,
};
