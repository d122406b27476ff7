//! Pull a JSON object out of free-form model text and coerce it into a draft.

use serde_json::{Map, Value};
use tally_core::{Category, TransactionDraft, TransactionType};

use crate::error::{MalformedModelOutput, UpstreamUnavailable};

/// Confidence assumed when the model omits one or sends garbage.
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 0.7;

/// First balanced `{...}` span in `text`.
///
/// Braces inside JSON string literals do not count toward nesting, so
/// `{"description": "a } b"}` is returned whole.
pub fn find_json_object(text: &str) -> Option<&str> {
    text.char_indices()
        .filter(|&(_, c)| c == '{')
        .find_map(|(start, _)| balanced_end(&text[start..]).map(|len| &text[start..start + len]))
}

/// Byte length of the balanced object starting at `s[0] == '{'`.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locate and parse the model's JSON object.
pub fn parse_model_object(text: &str) -> Result<Map<String, Value>, UpstreamUnavailable> {
    let raw = find_json_object(text).ok_or(UpstreamUnavailable::NoJsonObject)?;
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(UpstreamUnavailable::NotAnObject),
    }
}

/// Coerce every field into its allowed range. `input` backs a missing description.
///
/// Returns the draft plus one entry per field that had to be coerced.
pub fn sanitize(
    obj: &Map<String, Value>,
    input: &str,
) -> (TransactionDraft, Vec<MalformedModelOutput>) {
    let mut issues = Vec::new();
    let mut flag = |field: &'static str, reason: String| {
        issues.push(MalformedModelOutput { field, reason });
    };

    let amount = match obj.get("amount").and_then(number_like) {
        Some(n) => n.abs(),
        None => {
            flag("amount", format!("not numeric: {}", show(obj.get("amount"))));
            0.0
        }
    };

    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| input.trim())
        .to_string();

    let category = match obj.get("category").and_then(Value::as_str).and_then(Category::from_name) {
        Some(c) => c,
        None => {
            flag("category", format!("not in enumeration: {}", show(obj.get("category"))));
            Category::Other
        }
    };

    let kind = match obj.get("type").and_then(Value::as_str).and_then(TransactionType::from_name) {
        Some(k) => k,
        None => {
            flag("type", format!("not income/expense: {}", show(obj.get("type"))));
            TransactionType::Expense
        }
    };

    let merchant = obj
        .get("merchant")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let confidence = match obj.get("confidence").and_then(number_like) {
        Some(c) => {
            if !(0.0..=1.0).contains(&c) {
                flag("confidence", format!("out of range: {c}"));
            }
            c.clamp(0.0, 1.0)
        }
        None => DEFAULT_MODEL_CONFIDENCE,
    };

    let draft = TransactionDraft {
        amount,
        description,
        category,
        kind,
        merchant,
        confidence,
    };
    (draft, issues)
}

/// Numbers, or strings like "$1,234.50".
fn number_like(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', "").parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn show(v: Option<&Value>) -> String {
    v.map(Value::to_string).unwrap_or_else(|| "missing".to_string())
}
