//! Keyword heuristic parser for environments without model access.
//!
//! No LLM involved: amount via the shared regex, direction and category from
//! a handful of keywords.

use tally_core::{Category, RecentTransaction, TransactionDraft, TransactionType};

use crate::error::ParseError;
use crate::fallback::extract_amount;
use crate::{TransactionParser, require_input};

pub const HEURISTIC_CONFIDENCE: f64 = 0.8;

const INCOME_KEYWORDS: [&str; 4] = ["salary", "income", "paid", "received"];

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicParser;

impl HeuristicParser {
    pub fn new() -> Self {
        Self
    }
}

impl TransactionParser for HeuristicParser {
    fn parse(
        &self,
        input: &str,
        _recent: &[RecentTransaction],
    ) -> Result<TransactionDraft, ParseError> {
        let input = require_input(input)?;
        let text = input.to_lowercase();

        let kind = if INCOME_KEYWORDS.iter().any(|k| text.contains(k)) {
            TransactionType::Income
        } else {
            TransactionType::Expense
        };

        Ok(TransactionDraft {
            amount: extract_amount(&text),
            description: input.to_string(),
            category: categorize(&text),
            kind,
            merchant: None,
            confidence: HEURISTIC_CONFIDENCE,
        })
    }
}

/// Later rules win, so "gas station food" is Transportation.
fn categorize(text: &str) -> Category {
    let mut category = Category::Other;
    if text.contains("coffee") || text.contains("food") {
        category = Category::Food;
    }
    if text.contains("gas") || text.contains("uber") {
        category = Category::Transportation;
    }
    category
}
