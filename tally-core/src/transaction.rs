//! Transaction types: parser drafts, stored records, and the create/update
//! payload with its validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Fixed spending/income categories. Anything outside this set coerces to `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Food,
    Transportation,
    Shopping,
    Entertainment,
    Bills,
    Healthcare,
    Education,
    Travel,
    Electronics,
    Gas,
    Income,
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Food,
        Category::Transportation,
        Category::Shopping,
        Category::Entertainment,
        Category::Bills,
        Category::Healthcare,
        Category::Education,
        Category::Travel,
        Category::Electronics,
        Category::Gas,
        Category::Income,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Travel => "Travel",
            Category::Electronics => "Electronics",
            Category::Gas => "Gas",
            Category::Income => "Income",
            Category::Other => "Other",
        }
    }

    /// Match a category name case-insensitively. Returns `None` for anything
    /// that is not exactly one of the enumerated names.
    pub fn from_name(name: &str) -> Option<Category> {
        let name = name.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }

    /// Like [`Category::from_name`] but folds unknown values into `Other`.
    pub fn coerce(name: &str) -> Category {
        Category::from_name(name).unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of money movement. The sign lives here, never in the amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn from_name(name: &str) -> Option<TransactionType> {
        match name.trim().to_ascii_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type value as found on a stored record.
///
/// Upstream validation only lets `income`/`expense` through, but records come
/// from an external store, so an unexpected literal is carried verbatim
/// instead of failing the whole read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeTag {
    Income,
    Expense,
    Unrecognized(String),
}

impl TypeTag {
    pub fn known(&self) -> Option<TransactionType> {
        match self {
            TypeTag::Income => Some(TransactionType::Income),
            TypeTag::Expense => Some(TransactionType::Expense),
            TypeTag::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Income => "income",
            TypeTag::Expense => "expense",
            TypeTag::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for TypeTag {
    fn from(raw: String) -> Self {
        match TransactionType::from_name(&raw) {
            Some(kind) => kind.into(),
            None => TypeTag::Unrecognized(raw),
        }
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl From<TransactionType> for TypeTag {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Income => TypeTag::Income,
            TransactionType::Expense => TypeTag::Expense,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured transaction candidate produced by a parser, awaiting user confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionDraft {
    /// Absolute value; direction is carried by `kind`
    pub amount: f64,
    pub description: String,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub merchant: Option<String>,
    /// Parser certainty in [0, 1]
    pub confidence: f64,
}

impl TransactionDraft {
    /// Turn a confirmed draft into a create payload flagged as parser-produced.
    pub fn into_new_transaction(self, date: Option<DateTime<Utc>>) -> NewTransaction {
        NewTransaction {
            amount: Some(self.amount),
            description: Some(self.description),
            category: Some(self.category.as_str().to_string()),
            kind: Some(self.kind.as_str().to_string()),
            date,
            ai_parsed: true,
            confidence: Some(self.confidence),
        }
    }
}

/// Minimal shape of a prior transaction handed to the parser as pattern context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub amount: f64,
    pub category: Category,
}

impl From<&StoredTransaction> for RecentTransaction {
    fn from(txn: &StoredTransaction) -> Self {
        Self {
            kind: txn.kind.known().unwrap_or(TransactionType::Expense),
            description: txn.description.clone(),
            amount: txn.amount_or_zero(),
            category: txn.category_or_other(),
        }
    }
}

/// A persisted transaction as handed back by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredTransaction {
    pub id: String,
    #[serde(alias = "userId")]
    pub owner: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: Option<Category>,
    #[serde(rename = "type")]
    pub kind: TypeTag,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub ai_parsed: bool,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl StoredTransaction {
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }

    pub fn category_or_other(&self) -> Category {
        self.category.unwrap_or(Category::Other)
    }
}

fn default_confidence() -> f64 {
    1.0
}

fn lenient_category<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Category::from_name))
}

/// Rejections from the create/update path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("amount must be a non-zero number, got {0}")]
    InvalidAmount(f64),
    #[error("type must be income or expense, got {0:?}")]
    InvalidType(String),
}

/// Create/update payload exactly as a client submits it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ai_parsed: bool,
    pub confidence: Option<f64>,
}

/// Normalized fields of a payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTransaction {
    pub amount: f64,
    pub description: String,
    pub category: Category,
    pub kind: TransactionType,
    pub date: DateTime<Utc>,
    pub ai_parsed: bool,
    pub confidence: f64,
}

impl NewTransaction {
    /// Check required fields and normalize: absolute amount, trimmed
    /// description, category coerced into the enumeration, date defaulting
    /// to `now`, confidence defaulting to 1.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidTransaction, ValidationError> {
        let amount = self.amount.ok_or(ValidationError::MissingField("amount"))?;
        if amount == 0.0 || !amount.is_finite() {
            return Err(ValidationError::InvalidAmount(amount));
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(ValidationError::MissingField("description"))?
            .to_string();

        let category = self
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(Category::coerce)
            .ok_or(ValidationError::MissingField("category"))?;

        let raw_kind = self
            .kind
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ValidationError::MissingField("type"))?;
        let kind = TransactionType::from_name(raw_kind)
            .ok_or_else(|| ValidationError::InvalidType(raw_kind.to_string()))?;

        Ok(ValidTransaction {
            amount: amount.abs(),
            description,
            category,
            kind,
            date: self.date.unwrap_or(now),
            ai_parsed: self.ai_parsed,
            confidence: self.confidence.map(|c| c.clamp(0.0, 1.0)).unwrap_or(1.0),
        })
    }
}

impl ValidTransaction {
    pub fn into_stored(
        self,
        id: impl Into<String>,
        owner: impl Into<String>,
        now: DateTime<Utc>,
    ) -> StoredTransaction {
        StoredTransaction {
            id: id.into(),
            owner: owner.into(),
            amount: Some(self.amount),
            description: self.description,
            category: Some(self.category),
            kind: self.kind.into(),
            date: self.date,
            ai_parsed: self.ai_parsed,
            confidence: self.confidence,
            created_at: Some(now),
        }
    }

    /// Overwrite the user-editable fields of an existing record.
    pub fn apply_to(self, record: &mut StoredTransaction) {
        record.amount = Some(self.amount);
        record.description = self.description;
        record.category = Some(self.category);
        record.kind = self.kind.into();
        record.date = self.date;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn payload() -> NewTransaction {
        NewTransaction {
            amount: Some(-42.5),
            description: Some("  Groceries at Trader Joe's  ".to_string()),
            category: Some("food".to_string()),
            kind: Some("expense".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_category_from_name() {
        assert_eq!(Category::from_name("food"), Some(Category::Food));
        assert_eq!(Category::from_name(" Transportation "), Some(Category::Transportation));
        assert_eq!(Category::from_name("Groceries"), None);
        assert_eq!(Category::coerce("Groceries"), Category::Other);
    }

    #[test]
    fn test_type_tag_roundtrips_unknown_literal() {
        let tag: TypeTag = serde_json::from_str("\"transfer\"").unwrap();
        assert_eq!(tag, TypeTag::Unrecognized("transfer".to_string()));
        assert_eq!(tag.known(), None);
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"transfer\"");
    }

    #[test]
    fn test_type_tag_ignores_case_and_padding() {
        assert_eq!(TypeTag::from("Income".to_string()), TypeTag::Income);
        assert_eq!(TypeTag::from(" EXPENSE ".to_string()), TypeTag::Expense);
        let tag: TypeTag = serde_json::from_str("\"Expense\"").unwrap();
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"expense\"");
    }

    #[test]
    fn test_draft_serializes_with_wire_names() {
        let draft = TransactionDraft {
            amount: 5.5,
            description: "Coffee".to_string(),
            category: Category::Food,
            kind: TransactionType::Expense,
            merchant: None,
            confidence: 0.8,
        };
        let v = serde_json::to_value(&draft).unwrap();
        assert_eq!(v["type"], "expense");
        assert_eq!(v["category"], "Food");
        assert!(v["merchant"].is_null());
    }

    #[test]
    fn test_stored_tolerates_missing_and_unknown_fields() {
        let json = r#"{
            "id": "t1",
            "userId": "u1",
            "category": "Groceries",
            "type": "expense",
            "date": "2026-02-18T10:00:00Z"
        }"#;
        let txn: StoredTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.owner, "u1");
        assert_eq!(txn.amount, None);
        assert_eq!(txn.category, None);
        assert_eq!(txn.amount_or_zero(), 0.0);
        assert_eq!(txn.category_or_other(), Category::Other);
        assert_eq!(txn.confidence, 1.0);
    }

    #[test]
    fn test_validate_normalizes() {
        let valid = payload().validate(now()).unwrap();
        assert_eq!(valid.amount, 42.5);
        assert_eq!(valid.description, "Groceries at Trader Joe's");
        assert_eq!(valid.category, Category::Food);
        assert_eq!(valid.kind, TransactionType::Expense);
        assert_eq!(valid.date, now());
        assert_eq!(valid.confidence, 1.0);
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut p = payload();
        p.amount = None;
        assert_eq!(p.validate(now()), Err(ValidationError::MissingField("amount")));

        let mut p = payload();
        p.description = Some("   ".to_string());
        assert_eq!(p.validate(now()), Err(ValidationError::MissingField("description")));

        let mut p = payload();
        p.category = None;
        assert_eq!(p.validate(now()), Err(ValidationError::MissingField("category")));

        let mut p = payload();
        p.kind = None;
        assert_eq!(p.validate(now()), Err(ValidationError::MissingField("type")));
    }

    #[test]
    fn test_validate_rejects_bad_type_and_zero_amount() {
        let mut p = payload();
        p.kind = Some("transfer".to_string());
        assert_eq!(
            p.validate(now()),
            Err(ValidationError::InvalidType("transfer".to_string()))
        );

        let mut p = payload();
        p.amount = Some(0.0);
        assert_eq!(p.validate(now()), Err(ValidationError::InvalidAmount(0.0)));
    }

    #[test]
    fn test_draft_into_new_transaction_marks_ai_parsed() {
        let draft = TransactionDraft {
            amount: 12.0,
            description: "Uber ride".to_string(),
            category: Category::Transportation,
            kind: TransactionType::Expense,
            merchant: Some("Uber".to_string()),
            confidence: 0.8,
        };
        let new = draft.into_new_transaction(None);
        assert!(new.ai_parsed);
        let valid = new.validate(now()).unwrap();
        assert_eq!(valid.category, Category::Transportation);
        assert_eq!(valid.confidence, 0.8);
    }
}
