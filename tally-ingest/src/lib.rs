//! tally-ingest: load stored transactions from JSON or CSV files.

pub mod csv_records;

pub use csv_records::{load_csv, read_csv};

use anyhow::{Context, Result, bail};
use std::path::Path;
use tally_core::StoredTransaction;

/// Load a JSON array of stored transaction records.
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<StoredTransaction>> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// Pick a loader by file extension. `owner` applies to CSV rows, which carry
/// no owner column; JSON records keep their own.
pub fn load_path(path: impl AsRef<Path>, owner: &str) -> Result<Vec<StoredTransaction>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let txns = match ext.as_deref() {
        Some("json") => load_json(path)?,
        Some("csv") => load_csv(path, owner)?,
        _ => bail!("unsupported file type: {} (expected .json or .csv)", path.display()),
    };
    log::info!("loaded {} transactions from {}", txns.len(), path.display());
    Ok(txns)
}
