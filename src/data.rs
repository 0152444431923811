//! Historical close loading
//!
//! Reads `date,close` CSV files for replay runs. Rows must be
//! chronological; the first row's date becomes the window start.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

/// One row of a close-price file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Load daily closes from a CSV file with `date,close` columns
pub fn load_closes(path: impl AsRef<Path>) -> Result<Vec<DatedClose>> {
    let mut reader = csv::Reader::from_path(path.as_ref()).context("Failed to open CSV file")?;

    let mut rows: Vec<DatedClose> = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let date_str = record.get(0).context("Missing date column")?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .context(format!("Failed to parse date: {}", date_str))?;

        let close: f64 = record
            .get(1)
            .context("Missing close column")?
            .trim()
            .parse()
            .context(format!("Failed to parse close on row {}", row_idx + 1))?;
        if close <= 0.0 {
            anyhow::bail!("Non-positive close {} on row {}", close, row_idx + 1);
        }

        if let Some(prev) = rows.last() {
            if date <= prev.date {
                anyhow::bail!("Rows out of order: {} follows {}", date, prev.date);
            }
        }

        rows.push(DatedClose { date, close });
    }

    if rows.is_empty() {
        anyhow::bail!("No rows in {}", path.as_ref().display());
    }

    info!(
        "Loaded {} closes from {}",
        rows.len(),
        path.as_ref().display()
    );
    Ok(rows)
}
