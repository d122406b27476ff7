//! tally-parse: free-text transaction parsing (keyword heuristic, or an LLM
//! call with a deterministic fallback)

pub mod completion;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod heuristic;
pub mod llm_parser;
pub mod prompt;

pub use completion::{CompletionConfig, HttpCompleter, Provider, TextCompletion};
pub use error::{MalformedModelOutput, ParseError, UpstreamUnavailable};
pub use heuristic::HeuristicParser;
pub use llm_parser::LlmParser;

use tally_core::{RecentTransaction, TransactionDraft};

/// Turns one free-text description into a draft.
///
/// Implementations only fail on blank input; every other problem degrades
/// to a lower-confidence draft.
pub trait TransactionParser {
    fn parse(
        &self,
        input: &str,
        recent: &[RecentTransaction],
    ) -> Result<TransactionDraft, ParseError>;
}

pub(crate) fn require_input(input: &str) -> Result<&str, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::InvalidInput);
    }
    Ok(trimmed)
}
