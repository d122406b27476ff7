//! Aggregate views over an owner-scoped, date-filtered set of stored
//! transactions: income/expense summary, category totals, and time trends.
//!
//! Every function here is a pure read over its input.

use chrono::{Datelike, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::transaction::{Category, StoredTransaction, TransactionType, TypeTag};

/// Income vs. expenses for a set of transactions.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub income: f64,
    pub expenses: f64,
    pub savings: f64,
    /// Percentage of income kept; 0 when there is no income
    pub savings_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub amount: f64,
    pub count: usize,
}

/// Bucket width for trend aggregation
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    /// Map a period name onto a granularity. Only `daily` is daily; every
    /// other value groups by month.
    pub fn from_period(period: &str) -> Granularity {
        if period.trim().eq_ignore_ascii_case("daily") {
            Granularity::Daily
        } else {
            Granularity::Monthly
        }
    }
}

/// Grouping key for trends, ordered as a tuple (year, month, day, type).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrendKey {
    pub year: i32,
    pub month: u32,
    pub day: Option<u32>,
    pub kind: TypeTag,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendBucket {
    pub year: i32,
    pub month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(rename = "type")]
    pub kind: TypeTag,
    pub total: f64,
}

/// Sum income and expenses and derive savings and savings rate.
///
/// Records whose type is neither income nor expense are left out of both sums.
pub fn summarize<'a>(txns: impl IntoIterator<Item = &'a StoredTransaction>) -> AnalyticsSummary {
    let mut income = 0.0;
    let mut expenses = 0.0;

    for txn in txns {
        match txn.kind.known() {
            Some(TransactionType::Income) => income += txn.amount_or_zero(),
            Some(TransactionType::Expense) => expenses += txn.amount_or_zero(),
            None => {}
        }
    }

    let savings = income - expenses;
    let savings_rate = if income > 0.0 {
        (savings / income) * 100.0
    } else {
        0.0
    };

    AnalyticsSummary {
        income,
        expenses,
        savings,
        savings_rate,
    }
}

/// Total and count per category, largest total first.
///
/// Missing categories fold into `Other`. Equal totals keep enumeration order.
pub fn breakdown_by_category<'a>(
    txns: impl IntoIterator<Item = &'a StoredTransaction>,
) -> Vec<CategoryBreakdown> {
    let mut groups: BTreeMap<Category, (f64, usize)> = BTreeMap::new();

    for txn in txns {
        let entry = groups.entry(txn.category_or_other()).or_insert((0.0, 0));
        entry.0 += txn.amount_or_zero();
        entry.1 += 1;
    }

    let mut out: Vec<CategoryBreakdown> = groups
        .into_iter()
        .map(|(category, (amount, count))| CategoryBreakdown {
            category,
            amount,
            count,
        })
        .collect();

    // sort_by is stable, so ties stay in BTreeMap (enumeration) order
    out.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    out
}

/// Trend buckets keyed on UTC calendar dates.
pub fn bucket_trends<'a>(
    txns: impl IntoIterator<Item = &'a StoredTransaction>,
    granularity: Granularity,
) -> Vec<TrendBucket> {
    bucket_trends_in(txns, granularity, &Utc)
}

/// Trend buckets keyed on calendar dates in `tz`.
///
/// One bucket per (date key, type); output is ascending by year, month, day.
pub fn bucket_trends_in<'a, Tz: TimeZone>(
    txns: impl IntoIterator<Item = &'a StoredTransaction>,
    granularity: Granularity,
    tz: &Tz,
) -> Vec<TrendBucket> {
    let mut totals: BTreeMap<TrendKey, f64> = BTreeMap::new();

    for txn in txns {
        let local = txn.date.with_timezone(tz).date_naive();
        let key = TrendKey {
            year: local.year(),
            month: local.month(),
            day: match granularity {
                Granularity::Daily => Some(local.day()),
                Granularity::Monthly => None,
            },
            kind: txn.kind.clone(),
        };
        *totals.entry(key).or_insert(0.0) += txn.amount_or_zero();
    }

    totals
        .into_iter()
        .map(|(key, total)| TrendBucket {
            year: key.year,
            month: key.month,
            day: key.day,
            kind: key.kind,
            total,
        })
        .collect()
}
