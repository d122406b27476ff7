//! Prompt construction for the model path.

use tally_core::{Category, RecentTransaction};

/// How many recent transactions are shown to the model as context.
pub const MAX_CONTEXT_TRANSACTIONS: usize = 5;

/// One line per recent transaction: `<type>: <description> - $<amount> (<category>)`.
/// `recent` is expected newest first; only the first five are used.
pub fn build_context(recent: &[RecentTransaction]) -> String {
    recent
        .iter()
        .take(MAX_CONTEXT_TRANSACTIONS)
        .map(|t| format!("{}: {} - ${} ({})", t.kind, t.description, t.amount, t.category))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(input: &str, recent: &[RecentTransaction]) -> String {
    let categories = Category::ALL
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let context = build_context(recent);
    let context = if context.is_empty() {
        "(none)".to_string()
    } else {
        context
    };

    format!(
        r#"You are a personal finance assistant. Parse the transaction below into structured data.

Recent transactions for context:
{context}

Transaction: "{input}"

Respond with a single JSON object and nothing else, with exactly these fields:
{{"amount": number, "description": string, "category": string, "type": string, "merchant": string or null, "confidence": number}}

Rules:
- amount is a positive number without currency symbols
- category must be one of: {categories}
- type must be "income" or "expense"
- merchant is the business name if one is mentioned, otherwise null
- confidence is your certainty between 0 and 1"#
    )
}
