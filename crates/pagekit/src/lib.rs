//! Pagekit library.
//!
//! Filtered pagination with summary aggregation over SQL stores. Callers
//! build a [`Query`] over a table, describe the request with
//! [`PaginatorOptions`] and run it through a [`Paginator`] against an open
//! pool implementing [`Store`].

pub mod config;
pub mod error;
pub mod pagination;
pub mod store;

pub use config::Config;
pub use error::{PaginationError, Result};
pub use pagination::{
    Bucket, ComparisonOperator, Filter, FilterManager, FilterValue, Ordering, PageResult,
    Paginator, PaginatorOptions, Prefetch, Query, RawSort, SortDirection, Summary,
    SummaryDirective, SummaryEngine, SummaryValue,
};
pub use store::{Dialect, Store};
