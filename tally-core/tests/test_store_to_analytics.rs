use chrono::{TimeZone, Utc};
use tally_core::query;
use tally_core::{
    Category, Granularity, MemoryStore, NewTransaction, TransactionQuery, TransactionStore,
    TypeTag, breakdown_by_category, bucket_trends, summarize,
};

fn entry(amount: f64, description: &str, category: &str, kind: &str, day: u32) -> NewTransaction {
    NewTransaction {
        amount: Some(amount),
        description: Some(description.to_string()),
        category: Some(category.to_string()),
        kind: Some(kind.to_string()),
        date: Some(Utc.with_ymd_and_hms(2026, 2, day, 12, 0, 0).unwrap()),
        ..Default::default()
    }
}

fn seeded() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert("alice", entry(3000.0, "Salary", "Income", "income", 1)).unwrap();
    store.insert("alice", entry(-1200.0, "Rent", "Bills", "expense", 1)).unwrap();
    store.insert("alice", entry(5.5, "Coffee", "Food", "expense", 3)).unwrap();
    store.insert("alice", entry(42.0, "Groceries", "Food", "expense", 3)).unwrap();
    store.insert("alice", entry(18.0, "Uber", "Transportation", "expense", 9)).unwrap();
    store.insert("bob", entry(999.0, "Laptop", "Electronics", "expense", 3)).unwrap();
    store
}

/// Owner-scoped records flow through the query layer into all three aggregates.
#[test]
fn test_owner_records_aggregate_end_to_end() {
    let store = seeded();
    let records = store.find(&TransactionQuery::for_owner("alice"));
    assert_eq!(records.len(), 5);

    let summary = summarize(&records);
    assert_eq!(summary.income, 3000.0);
    assert_eq!(summary.expenses, 1265.5);
    assert_eq!(summary.savings, 1734.5);
    assert!((summary.savings_rate - 57.816_666).abs() < 1e-3);

    let expenses = store.find(&TransactionQuery::for_categories("alice", None));
    let categories = breakdown_by_category(&expenses);
    assert_eq!(categories[0].category, Category::Bills);
    assert_eq!(categories[1].category, Category::Food);
    assert_eq!(categories[1].count, 2);
    assert!(categories.iter().all(|c| c.category != Category::Electronics));

    let trends = bucket_trends(&records, Granularity::Daily);
    let feb1: Vec<_> = trends.iter().filter(|b| b.day == Some(1)).collect();
    assert_eq!(feb1.len(), 2);
    assert!(feb1.iter().any(|b| b.kind == TypeTag::Income && b.total == 3000.0));
    assert!(feb1.iter().any(|b| b.kind == TypeTag::Expense && b.total == 1200.0));
    for w in trends.windows(2) {
        assert!((w[0].year, w[0].month, w[0].day) <= (w[1].year, w[1].month, w[1].day));
    }
}

#[test]
fn test_date_range_narrows_summary() {
    let store = seeded();
    let q = TransactionQuery::for_owner("alice").between(
        Some(Utc.with_ymd_and_hms(2026, 2, 2, 0, 0, 0).unwrap()),
        Some(Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap()),
    );
    let summary = summarize(&store.find(&q));
    assert_eq!(summary.income, 0.0);
    assert_eq!(summary.expenses, 65.5);
    assert_eq!(summary.savings_rate, 0.0);
}

#[test]
fn test_listing_pages_through_store_records() {
    let store = seeded();
    let q = TransactionQuery::for_owner("alice");
    let page = query::list(store.records(), &q, 1, 2);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.pages, 3);
    assert_eq!(page.transactions[0].description, "Uber");
}
