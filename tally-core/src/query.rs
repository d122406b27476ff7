//! Owner-scoped filtering and paginated listing of stored transactions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;

use crate::time::days_before;
use crate::transaction::{Category, StoredTransaction, TransactionType};

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const DEFAULT_TREND_DAYS: u32 = 30;

/// Filter applied before any aggregation. Date bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    pub owner: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub category: Option<Category>,
    pub kind: Option<TransactionType>,
}

impl TransactionQuery {
    pub fn for_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            start: None,
            end: None,
            category: None,
            kind: None,
        }
    }

    pub fn between(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn with_kind(mut self, kind: Option<TransactionType>) -> Self {
        self.kind = kind;
        self
    }

    /// Everything the owner recorded in the last `days` days.
    pub fn trend_window(owner: impl Into<String>, now: DateTime<Utc>, days: u32) -> Self {
        Self::for_owner(owner).between(Some(days_before(now, days)), None)
    }

    /// Category breakdowns look at expenses unless told otherwise.
    pub fn for_categories(owner: impl Into<String>, kind: Option<TransactionType>) -> Self {
        Self::for_owner(owner).with_kind(Some(kind.unwrap_or(TransactionType::Expense)))
    }

    pub fn matches(&self, txn: &StoredTransaction) -> bool {
        if txn.owner != self.owner {
            return false;
        }
        if self.start.is_some_and(|start| txn.date < start) {
            return false;
        }
        if self.end.is_some_and(|end| txn.date > end) {
            return false;
        }
        if let Some(category) = self.category {
            if txn.category_or_other() != category {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if txn.kind.known() != Some(kind) {
                return false;
            }
        }
        true
    }
}

pub fn filter<'a>(
    txns: &'a [StoredTransaction],
    query: &TransactionQuery,
) -> Vec<&'a StoredTransaction> {
    txns.iter().filter(|t| query.matches(t)).collect()
}

/// Pagination metadata for a listing
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Listing {
    pub transactions: Vec<StoredTransaction>,
    pub pagination: Page,
}

/// Matching transactions newest first (by date, then creation time), one page at a time.
///
/// `page` is 1-based; page and limit below 1 are raised to 1.
pub fn list(
    txns: &[StoredTransaction],
    query: &TransactionQuery,
    page: usize,
    limit: usize,
) -> Listing {
    let page = page.max(1);
    let limit = limit.max(1);

    let mut matching = filter(txns, query);
    matching.sort_by_key(|t| Reverse((t.date, t.created_at)));

    let total = matching.len();
    let transactions = matching
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .cloned()
        .collect();

    Listing {
        transactions,
        pagination: Page {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        },
    }
}
