//! Paginator: runs one paginated request against a store.
//!
//! A request executes in a fixed order: validate, page window, filters,
//! groups, orderings, raw sorts, fetch, count, total pages, summary. Fetch,
//! count and every summary directive are separate round trips; the first
//! failure aborts the call and no partial result is returned.

use std::sync::Arc;

use parking_lot::Mutex;
use sqlx::{Database, FromRow};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ordering::RawSort;
use super::query_builder::Query;
use super::summary::{SummaryDirective, SummaryEngine};
use super::types::{PageResult, PaginatorOptions, total_pages};
use crate::config::Config;
use crate::error::{PaginationError, Result};
use crate::store::Store;

/// One paginated request. Consumed by [`Paginator::paginate`].
pub struct Paginator<'a, S: Store> {
    store: &'a S,
    query: Query,
    options: PaginatorOptions,
    config: Config,
}

/// Validated request state, built before any round trip.
struct Plan {
    page: u32,
    page_size: u32,
    /// Base query with filters only.
    filtered: Query,
    /// `filtered` plus GROUP BY.
    grouped: Query,
    directives: Vec<SummaryDirective>,
    raw_sorts: Vec<RawSort>,
}

impl Plan {
    /// Row query for `page`: groups, orderings, raw sorts, then the window.
    fn page_query(&self, options: &PaginatorOptions, page: u32) -> Query {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(self.page_size);

        let query = options
            .orderings
            .iter()
            .fold(self.grouped.clone(), |query, ordering| ordering.apply(query));
        let query = self
            .raw_sorts
            .iter()
            .fold(query, |query, sort| sort.apply(query));

        query.offset(offset).limit(u64::from(self.page_size))
    }
}

impl<'a, S: Store> Paginator<'a, S> {
    /// Create a paginator over an already-built query.
    pub fn new(store: &'a S, query: Query, options: PaginatorOptions) -> Self {
        Self {
            store,
            query,
            options,
            config: Config::default(),
        }
    }

    /// Use a loaded [`Config`] for page size defaults and limits.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Run the request and return one page.
    pub async fn paginate<T>(self) -> Result<PageResult<T>>
    where
        T: for<'r> FromRow<'r, <S::Db as Database>::Row> + Send + Unpin,
    {
        let plan = self.plan()?;
        self.execute(&plan).await
    }

    /// Like [`Paginator::paginate`], and also start fetching the next page in
    /// the background when there is one.
    pub async fn paginate_with_prefetch<T>(self) -> Result<(PageResult<T>, Option<Prefetch<T>>)>
    where
        S: Clone + 'static,
        T: for<'r> FromRow<'r, <S::Db as Database>::Row> + Send + Unpin + 'static,
    {
        let plan = self.plan()?;
        let result = self.execute::<T>(&plan).await?;

        if !result.has_next {
            return Ok((result, None));
        }

        let next_page = plan.page + 1;
        let sql = plan
            .page_query(&self.options, next_page)
            .build_select(self.store.dialect());
        let prefetch = Prefetch::spawn(self.store.clone(), sql, next_page);

        Ok((result, Some(prefetch)))
    }

    /// Validate options and build every query the request needs.
    fn plan(&self) -> Result<Plan> {
        let page_size = self.resolve_page_size()?;
        if self.options.page == 0 {
            return Err(PaginationError::InvalidPage);
        }

        let directives = SummaryDirective::parse_all(&self.options.summary_fields)?;
        let raw_sorts = self
            .options
            .sort
            .iter()
            .map(|sort| sort.parse::<RawSort>())
            .collect::<Result<Vec<_>>>()?;

        let filtered = self
            .options
            .filters
            .iter()
            .fold(self.query.clone(), |query, filter| filter.apply(query));
        let grouped = filtered.clone().group_by(self.options.groups.iter().cloned());

        Ok(Plan {
            page: self.options.page,
            page_size,
            filtered,
            grouped,
            directives,
            raw_sorts,
        })
    }

    fn resolve_page_size(&self) -> Result<u32> {
        let requested = self
            .options
            .page_size
            .unwrap_or(self.config.default_page_size);

        if requested == 0 {
            return Err(PaginationError::InvalidPageSize);
        }

        if requested > self.config.max_page_size {
            warn!(
                requested = requested,
                capped = self.config.max_page_size,
                "page_size exceeds maximum, capping"
            );
            return Ok(self.config.max_page_size);
        }

        Ok(requested)
    }

    async fn execute<T>(&self, plan: &Plan) -> Result<PageResult<T>>
    where
        T: for<'r> FromRow<'r, <S::Db as Database>::Row> + Send + Unpin,
    {
        let dialect = self.store.dialect();
        let table = self.query.table_name();

        let main_sql = plan
            .page_query(&self.options, plan.page)
            .build_select(dialect);
        debug!(table, sql = %main_sql, "fetching page");
        let rows: Vec<T> = self
            .store
            .fetch_rows(&main_sql)
            .await
            .map_err(|e| PaginationError::store("fetch", e))?;

        let count_sql = plan.grouped.build_count(dialect);
        debug!(table, sql = %count_sql, "counting rows");
        let total = self
            .store
            .fetch_count(&count_sql)
            .await
            .map_err(|e| PaginationError::store("count", e))?;
        let total = u64::try_from(total).unwrap_or_default();

        let summary = if plan.directives.is_empty() {
            None
        } else {
            Some(SummaryEngine::run(self.store, &plan.filtered, &plan.directives).await?)
        };

        debug!(
            table,
            page = plan.page,
            page_size = plan.page_size,
            total,
            total_pages = total_pages(total, plan.page_size),
            rows = rows.len(),
            "page ready"
        );

        Ok(PageResult::new(rows, total, plan.page, plan.page_size).with_summary(summary))
    }
}

/// Rows of the next page, fetched by a background task.
///
/// The task writes its outcome into a locked slot exactly once; the owner
/// reads it with [`Prefetch::try_take`] or [`Prefetch::wait`].
pub struct Prefetch<T> {
    page: u32,
    slot: Arc<Mutex<Option<Result<Vec<T>>>>>,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> Prefetch<T> {
    fn spawn<S>(store: S, sql: String, page: u32) -> Self
    where
        S: Store + 'static,
        T: for<'r> FromRow<'r, <S::Db as Database>::Row> + Unpin,
    {
        let slot = Arc::new(Mutex::new(None));
        let writer = Arc::clone(&slot);

        let handle = tokio::spawn(async move {
            debug!(page, sql = %sql, "prefetching page");
            let rows = store
                .fetch_rows::<T>(&sql)
                .await
                .map_err(|e| PaginationError::store("prefetch", e));
            *writer.lock() = Some(rows);
        });

        Self { page, slot, handle }
    }
}

impl<T> Prefetch<T> {
    /// Page number being prefetched.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Whether the background fetch has finished.
    pub fn is_ready(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Take the prefetched rows if the task has finished, without waiting.
    pub fn try_take(&self) -> Option<Result<Vec<T>>> {
        self.slot.lock().take()
    }

    /// Wait for the background fetch and return its rows.
    pub async fn wait(self) -> Result<Vec<T>> {
        self.handle
            .await
            .map_err(|e| PaginationError::Prefetch(e.to_string()))?;

        self.slot
            .lock()
            .take()
            .unwrap_or_else(|| Err(PaginationError::Prefetch("rows already taken".to_string())))
    }
}
