//! Sort terms.
//!
//! Terms apply in registration order: the first one added is the primary
//! sort key, later ones break ties.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::query_builder::Query;
use super::types::SortDirection;
use crate::error::PaginationError;

/// A typed ORDER BY term on a column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ordering {
    /// Column to sort by.
    pub field: String,

    /// Sort direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl Ordering {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Append this term to a query.
    pub fn apply(&self, query: Query) -> Query {
        query.order_by(self.field.clone(), self.direction)
    }
}

/// A literal ORDER BY term such as `"trx_amount desc"`.
///
/// A trailing `asc` or `desc` is split off as the direction. Anything else,
/// `"trx_amount desc nulls last"` or `"a, b"` for instance, is emitted exactly
/// as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSort {
    expression: String,
    direction: Option<SortDirection>,
}

impl RawSort {
    /// Sort expression without the direction.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Trailing direction, if one was given.
    pub fn direction(&self) -> Option<SortDirection> {
        self.direction
    }

    /// Append this term to a query.
    pub fn apply(&self, query: Query) -> Query {
        match self.direction {
            Some(direction) => {
                query.order_by_raw(format!("{} {}", self.expression, direction.as_sql()))
            }
            None => query.order_by_raw(self.expression.clone()),
        }
    }
}

impl FromStr for RawSort {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PaginationError::InvalidSort(s.to_string()));
        }

        if let Some((expression, last)) = trimmed.rsplit_once(char::is_whitespace)
            && let Ok(direction) = last.parse::<SortDirection>()
        {
            let expression = expression.trim_end();
            if expression.is_empty() {
                return Err(PaginationError::InvalidSort(s.to_string()));
            }
            return Ok(Self {
                expression: expression.to_string(),
                direction: Some(direction),
            });
        }

        Ok(Self {
            expression: trimmed.to_string(),
            direction: None,
        })
    }
}
