//! Query handle built on SeaQuery.
//!
//! A [`Query`] accumulates a table, WHERE predicates, GROUP BY columns, sort
//! terms and LIMIT/OFFSET. Composition never executes anything; the
//! renderers produce SQL text for a [`Dialect`]:
//! - `build_select`: the row query for one page; ORDER BY, LIMIT and OFFSET
//!   are written after SeaQuery renders the rest, so literal sort terms reach
//!   the database exactly as given
//! - `build_count`: total rows over the filters, ignoring paging and sorting
//! - `build_aggregate` / `build_buckets` / `build_value_count`: summary passes

use sea_query::{
    Alias, Asterisk, Cond, Condition, Expr, Func, Order, Query as SeaQuery, SelectStatement,
    SimpleExpr,
};

use super::types::SortDirection;
use crate::store::Dialect;

/// Alias of the text rendering selected alongside each bucket value.
pub(crate) const BUCKET_TEXT: &str = "value_text";

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SortTerm {
    Column(String, SortDirection),
    /// SQL text emitted as written, with no direction added.
    Literal(String),
}

impl SortTerm {
    fn to_sql(&self) -> String {
        match self {
            SortTerm::Column(column, direction) => {
                format!("\"{}\" {}", column.replace('"', "\"\""), direction.as_sql())
            }
            SortTerm::Literal(expression) => expression.clone(),
        }
    }
}

/// Immutable-by-convention query builder.
///
/// Every composition method consumes the handle and returns the extended
/// one, so a caller holding a clone keeps the earlier state.
#[derive(Debug, Clone)]
pub struct Query {
    table: String,
    columns: Vec<String>,
    condition: Condition,
    predicates: usize,
    groups: Vec<String>,
    orders: Vec<SortTerm>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    /// Start a query over a table.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            condition: Cond::all(),
            predicates: 0,
            groups: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Restrict the selected columns (default: `*`).
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// AND a predicate onto the query.
    pub fn and_where(mut self, expr: SimpleExpr) -> Self {
        self.condition = self.condition.add(expr);
        self.predicates += 1;
        self
    }

    /// AND one parenthesised OR group onto the query.
    ///
    /// An empty group leaves the query unchanged.
    pub fn and_any(mut self, exprs: Vec<SimpleExpr>) -> Self {
        if exprs.is_empty() {
            return self;
        }
        let any = exprs
            .into_iter()
            .fold(Cond::any(), |cond, expr| cond.add(expr));
        self.condition = self.condition.add(any);
        self.predicates += 1;
        self
    }

    /// Add GROUP BY columns.
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append a column sort term.
    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.orders.push(SortTerm::Column(column.into(), direction));
        self
    }

    /// Append a literal ORDER BY term such as `"amount desc nulls last"`.
    pub fn order_by_raw(mut self, expression: impl Into<String>) -> Self {
        self.orders.push(SortTerm::Literal(expression.into()));
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Base table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Whether any predicate has been added.
    pub fn has_filters(&self) -> bool {
        self.predicates > 0
    }

    /// GROUP BY columns in registration order.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Build the row query (WHERE, GROUP BY, ORDER BY, LIMIT/OFFSET).
    pub fn build_select(&self, dialect: Dialect) -> String {
        let mut query = self.filtered();

        // SELECT fields
        if self.columns.is_empty() {
            query.column(Asterisk);
        } else {
            for column in &self.columns {
                query.column(Alias::new(column));
            }
        }

        self.add_groups(&mut query);

        let mut sql = dialect.render(&query);

        if !self.orders.is_empty() {
            let terms: Vec<String> = self.orders.iter().map(SortTerm::to_sql).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {limit}")),
            // SQLite has no OFFSET without LIMIT
            (None, Some(_)) if dialect == Dialect::Sqlite => sql.push_str(" LIMIT -1"),
            _ => {}
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// Build a COUNT query over every filtered row.
    ///
    /// LIMIT, OFFSET and ORDER BY are ignored. With GROUP BY the grouped rows
    /// are counted, so the total matches what paging can return.
    pub fn build_count(&self, dialect: Dialect) -> String {
        if self.groups.is_empty() {
            let mut query = self.filtered();
            query.expr(Expr::col(Asterisk).count());
            return dialect.render(&query);
        }

        let mut grouped = self.filtered();
        grouped.expr(Expr::val(1));
        self.add_groups(&mut grouped);

        let mut query = SeaQuery::select();
        query
            .expr(Expr::col(Asterisk).count())
            .from_subquery(grouped, Alias::new("grouped"));
        dialect.render(&query)
    }

    /// Build a single-aggregate query over the filtered rows.
    pub fn build_aggregate(&self, dialect: Dialect, expr: SimpleExpr) -> String {
        let mut query = self.filtered();
        query.expr(expr);
        dialect.render(&query)
    }

    /// Build `field, COUNT(*) AS count, CAST(field AS TEXT) ... GROUP BY field`.
    ///
    /// The text column carries values whose type the store cannot decode
    /// directly (dates, numerics, uuids). Ordered by the value ascending, or
    /// by count descending (ties broken by value) when `by_count` is set.
    pub fn build_buckets(
        &self,
        dialect: Dialect,
        field: &str,
        by_count: bool,
        limit: Option<u64>,
    ) -> String {
        let mut query = self.filtered();
        query
            .column(Alias::new(field))
            .expr_as(Expr::col(Asterisk).count(), Alias::new("count"))
            .expr_as(
                Func::cast_as(Expr::col(Alias::new(field)), Alias::new("TEXT")),
                Alias::new(BUCKET_TEXT),
            )
            .group_by_col(Alias::new(field));

        if by_count {
            query.order_by(Alias::new("count"), Order::Desc);
        }
        query.order_by(Alias::new(field), Order::Asc);

        if let Some(limit) = limit {
            query.limit(limit);
        }

        dialect.render(&query)
    }

    /// Build `COUNT(*)` of rows where `field` is non-null, or equals `value`.
    pub fn build_value_count(&self, dialect: Dialect, field: &str, value: Option<&str>) -> String {
        let column = Expr::col(Alias::new(field));
        let predicate = match value {
            Some(value) => column.eq(value),
            None => column.is_not_null(),
        };

        let mut query = SeaQuery::select();
        query
            .expr(Expr::col(Asterisk).count())
            .from(Alias::new(&self.table))
            .cond_where(self.condition.clone().add(predicate));

        dialect.render(&query)
    }

    /// `CAST(<func>(field) AS <float>)` for numeric summaries.
    pub fn float_aggregate(dialect: Dialect, func: AggregateFunc, field: &str) -> SimpleExpr {
        let column = Expr::col(Alias::new(field));
        let call = match func {
            AggregateFunc::Sum => Func::sum(column),
            AggregateFunc::Min => Func::min(column),
            AggregateFunc::Max => Func::max(column),
        };
        Func::cast_as(call, Alias::new(dialect.float_type())).into()
    }

    /// SELECT skeleton with FROM and WHERE only.
    ///
    /// Predicates go through a single `cond_where`; SeaQuery rejects mixing
    /// it with `and_where` on one statement.
    fn filtered(&self) -> SelectStatement {
        let mut query = SeaQuery::select();
        query.from(Alias::new(&self.table));
        if self.predicates > 0 {
            query.cond_where(self.condition.clone());
        }
        query
    }

    fn add_groups(&self, query: &mut SelectStatement) {
        for group in &self.groups {
            query.group_by_col(Alias::new(group));
        }
    }
}

/// Numeric aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Sum,
    Min,
    Max,
}

/// Escape character used in LIKE patterns.
pub(crate) const LIKE_ESCAPE: char = '!';

/// Escape SQL LIKE wildcard characters (`%`, `_`, and the escape itself).
pub(crate) fn escape_like_wildcards(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}
