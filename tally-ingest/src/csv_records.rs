//! Load stored transactions from a CSV export.
//!
//! Header row: `date,description,amount,category,type[,id]`. Columns are
//! looked up by header name, so order does not matter.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Read;
use std::path::Path;
use tally_core::{Category, StoredTransaction, TypeTag};

pub fn load_csv(path: impl AsRef<Path>, owner: &str) -> Result<Vec<StoredTransaction>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_csv(file, owner).with_context(|| format!("reading {}", path.display()))
}

pub fn read_csv(reader: impl Read, owner: &str) -> Result<Vec<StoredTransaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("reading CSV header")?.clone();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let date_col = col("date").context("CSV is missing a date column")?;
    let desc_col = col("description");
    let amount_col = col("amount");
    let category_col = col("category");
    let type_col = col("type").context("CSV is missing a type column")?;
    let id_col = col("id");

    let mut txns = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

        let date = match parse_date(field(Some(date_col))) {
            Some(d) => d,
            None => {
                let raw = field(Some(date_col));
                log::warn!("skipping CSV row {}: unparseable date {:?}", row + 1, raw);
                continue;
            }
        };

        let amount = match field(amount_col) {
            "" => None,
            raw => {
                let parsed = parse_amount(raw);
                if parsed.is_none() {
                    log::warn!("CSV row {}: unparseable amount {:?}, treating as 0", row + 1, raw);
                }
                parsed
            }
        };

        let category = match field(category_col) {
            "" => None,
            raw => Category::from_name(raw),
        };

        let id = match field(id_col) {
            "" => format!("csv-{:04}", row + 1),
            raw => raw.to_string(),
        };

        txns.push(StoredTransaction {
            id,
            owner: owner.to_string(),
            amount,
            description: field(desc_col).to_string(),
            category,
            kind: TypeTag::from(field(Some(type_col)).to_string()),
            date,
            ai_parsed: false,
            confidence: 1.0,
            created_at: None,
        });
    }

    Ok(txns)
}

/// Magnitude of a bank-style amount (`-$1,200.00`, `$-5`, `40`). The sign
/// lives in the type column.
fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace([',', '$'], "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(f64::abs)
}

/// `YYYY-MM-DD` (midnight UTC) or RFC 3339.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
