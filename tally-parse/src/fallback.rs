//! Deterministic amount extraction, shared by the heuristic parser and the
//! model path's fallback.

use once_cell::sync::Lazy;
use regex::Regex;
use tally_core::{Category, TransactionDraft, TransactionType};

/// Confidence reported when the model path could not be used.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

// Optional currency symbol, digits, up to two decimals
static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?(\d+(?:\.\d{1,2})?)").expect("amount regex is valid"));

/// First amount-looking number in `text`, or 0 when there is none.
pub fn extract_amount(text: &str) -> f64 {
    AMOUNT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(f64::abs)
        .unwrap_or(0.0)
}

/// Low-confidence draft built from the raw text alone. Never fails.
pub fn fallback_draft(input: &str) -> TransactionDraft {
    TransactionDraft {
        amount: extract_amount(input),
        description: input.trim().to_string(),
        category: Category::Other,
        kind: TransactionType::Expense,
        merchant: None,
        confidence: FALLBACK_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_amount_with_symbol() {
        assert_eq!(extract_amount("Bought coffee for $5.50"), 5.5);
        assert_eq!(extract_amount("Uber ride $12"), 12.0);
    }

    #[test]
    fn test_extract_amount_takes_first_match() {
        assert_eq!(extract_amount("2 pizzas for $18.99"), 2.0);
    }

    #[test]
    fn test_extract_amount_truncates_extra_decimals() {
        assert_eq!(extract_amount("gas 40.129"), 40.12);
    }

    #[test]
    fn test_extract_amount_none() {
        assert_eq!(extract_amount("lunch with friends"), 0.0);
    }

    #[test]
    fn test_fallback_draft_shape() {
        let d = fallback_draft("  Bought coffee for $5.50 ");
        assert_eq!(d.amount, 5.5);
        assert_eq!(d.description, "Bought coffee for $5.50");
        assert_eq!(d.category, Category::Other);
        assert_eq!(d.kind, TransactionType::Expense);
        assert_eq!(d.merchant, None);
        assert_eq!(d.confidence, 0.3);
    }
}
