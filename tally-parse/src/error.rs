use thiserror::Error;

/// The only failure a parser hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("input is required")]
    InvalidInput,
}

/// Reasons the model path produced nothing usable. Always recovered by the
/// fallback extractor.
#[derive(Debug, Error)]
pub enum UpstreamUnavailable {
    #[error("model call failed: {0:#}")]
    Call(anyhow::Error),
    #[error("no JSON object in model response")]
    NoJsonObject,
    #[error("model JSON did not parse: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("model JSON was not an object")]
    NotAnObject,
}

/// A model field that violated its constraints and was coerced.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct MalformedModelOutput {
    pub field: &'static str,
    pub reason: String,
}
