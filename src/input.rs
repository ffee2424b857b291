use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::InputError;

#[derive(Debug, Deserialize)]
struct InputRow {
    supplier_id: String,
    vat_number: String,
}

/// Read `supplier_id,vat_number` rows into an ordered map.
///
/// A repeated supplier id keeps its first position and takes the last vat number.
pub fn read_records(path: &Path) -> Result<IndexMap<String, String>, InputError> {
    let file = std::fs::File::open(path)?;
    parse_records(file)
}

pub fn parse_records<R: std::io::Read>(reader: R) -> Result<IndexMap<String, String>, InputError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = IndexMap::new();

    for (i, row) in rdr.deserialize::<InputRow>().enumerate() {
        let row = row?;
        let line = i + 2;
        if row.supplier_id.is_empty() {
            return Err(InputError::EmptyField { row: line, column: "supplier_id" });
        }
        if row.vat_number.is_empty() {
            return Err(InputError::EmptyField { row: line, column: "vat_number" });
        }
        if let Some(previous) = records.insert(row.supplier_id.clone(), row.vat_number) {
            warn!(supplier_id = %row.supplier_id, %previous, "Duplicate supplier id, keeping last vat number");
        }
    }

    info!(records = records.len(), "Input loaded");
    Ok(records)
}
