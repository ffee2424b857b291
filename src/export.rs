use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use tracing::info;

use crate::scraper::ErrorLog;
use crate::table::ResultTable;

/// Header plus one line per row, no index column; missing cells are written empty.
pub fn write_table_csv(table: &ResultTable, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut wtr = Writer::from_writer(file);

    if !table.columns().is_empty() {
        wtr.write_record(table.columns())?;
    }
    for row in table.rows() {
        wtr.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    wtr.flush()?;

    info!(rows = table.len(), path = %path.display(), "Result table written");
    Ok(())
}

/// One JSON object, record key → message. Non-ASCII text is written as-is.
pub fn write_error_log(errors: &ErrorLog, path: &Path) -> Result<()> {
    let json = serde_json::to_string(errors)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all(json.as_bytes())?;

    info!(errors = errors.len(), path = %path.display(), "Error log written");
    Ok(())
}

/// Write the error log, then the result table. Both files are written even for an
/// empty batch.
pub fn write_outputs(
    table: &ResultTable,
    errors: &ErrorLog,
    table_path: &Path,
    error_path: &Path,
) -> Result<()> {
    write_error_log(errors, error_path)?;
    write_table_csv(table, table_path)
}
