//! tally-core: transaction types, validation, querying, and analytics

pub mod analytics;
pub mod query;
pub mod store;
pub mod time;
pub mod transaction;

pub use analytics::{
    AnalyticsSummary, CategoryBreakdown, Granularity, TrendBucket, TrendKey,
    breakdown_by_category, bucket_trends, bucket_trends_in, summarize,
};
pub use query::{Listing, Page, TransactionQuery};
pub use store::{MemoryStore, StoreError, TransactionStore};
pub use transaction::{
    Category, NewTransaction, RecentTransaction, StoredTransaction, TransactionDraft,
    TransactionType, TypeTag, ValidTransaction, ValidationError,
};
