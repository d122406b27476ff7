//! Model-backed parser: prompt → completion → JSON extraction → sanitize,
//! degrading to the regex fallback whenever the model path yields nothing usable.

use tally_core::{RecentTransaction, TransactionDraft};

use crate::completion::TextCompletion;
use crate::error::{ParseError, UpstreamUnavailable};
use crate::extract::{parse_model_object, sanitize};
use crate::fallback::fallback_draft;
use crate::prompt::build_prompt;
use crate::{TransactionParser, require_input};

pub struct LlmParser<C> {
    completer: C,
}

impl<C: TextCompletion> LlmParser<C> {
    pub fn new(completer: C) -> Self {
        Self { completer }
    }

    fn parse_with_model(
        &self,
        input: &str,
        recent: &[RecentTransaction],
    ) -> Result<TransactionDraft, UpstreamUnavailable> {
        let prompt = build_prompt(input, recent);
        let response = self
            .completer
            .complete(&prompt)
            .map_err(UpstreamUnavailable::Call)?;
        let obj = parse_model_object(&response)?;

        let (draft, issues) = sanitize(&obj, input);
        for issue in &issues {
            log::debug!("malformed model output coerced: {issue}");
        }
        Ok(draft)
    }
}

impl<C: TextCompletion> TransactionParser for LlmParser<C> {
    fn parse(
        &self,
        input: &str,
        recent: &[RecentTransaction],
    ) -> Result<TransactionDraft, ParseError> {
        let input = require_input(input)?;
        match self.parse_with_model(input, recent) {
            Ok(draft) => Ok(draft),
            Err(e) => {
                log::warn!("model parse unavailable, using fallback: {e}");
                Ok(fallback_draft(input))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use std::cell::RefCell;
    use tally_core::{Category, TransactionType};

    fn unreachable(_: &str) -> Result<String> {
        Err(anyhow!("connection refused"))
    }

    #[test]
    fn test_unreachable_model_falls_back() {
        let parser = LlmParser::new(unreachable);
        let d = parser.parse("Bought coffee for $5.50", &[]).unwrap();
        assert_eq!(d.amount, 5.5);
        assert_eq!(d.category, Category::Other);
        assert_eq!(d.kind, TransactionType::Expense);
        assert_eq!(d.confidence, 0.3);
    }

    #[test]
    fn test_model_response_is_used() {
        let parser = LlmParser::new(|_: &str| -> Result<String> {
            Ok(r#"Here is the result:
{"amount": 5.5, "description": "Coffee at Blue Bottle", "category": "Food", "type": "expense", "merchant": "Blue Bottle", "confidence": 0.95}"#
                .to_string())
        });
        let d = parser.parse("Bought coffee for $5.50", &[]).unwrap();
        assert_eq!(d.category, Category::Food);
        assert_eq!(d.merchant.as_deref(), Some("Blue Bottle"));
        assert_eq!(d.confidence, 0.95);
    }

    #[test]
    fn test_prose_only_response_falls_back() {
        let refusal = |_: &str| -> Result<String> { Ok("I cannot help with that.".to_string()) };
        let parser = LlmParser::new(refusal);
        let d = parser.parse("Rent 1200", &[]).unwrap();
        assert_eq!(d.amount, 1200.0);
        assert_eq!(d.confidence, 0.3);
    }

    #[test]
    fn test_blank_input_never_reaches_model() {
        let calls = RefCell::new(0);
        let parser = LlmParser::new(|_: &str| -> Result<String> {
            *calls.borrow_mut() += 1;
            Ok("{}".to_string())
        });
        assert_eq!(parser.parse("  ", &[]), Err(ParseError::InvalidInput));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_recent_transactions_reach_prompt() {
        let seen = RefCell::new(String::new());
        let parser = LlmParser::new(|p: &str| -> Result<String> {
            *seen.borrow_mut() = p.to_string();
            Err(anyhow!("timeout"))
        });
        let recent = vec![RecentTransaction {
            kind: TransactionType::Income,
            description: "Paycheck".to_string(),
            amount: 2000.0,
            category: Category::Income,
        }];
        parser.parse("coffee 4", &recent).unwrap();
        assert!(seen.borrow().contains("income: Paycheck - $2000 (Income)"));
    }
}
