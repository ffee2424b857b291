use indexmap::IndexMap;
use tracing::debug;

use crate::parser::{address, normalize_address, normalize_postal_address, postal};
use crate::scraper::lookup::FoundRecord;
use crate::scraper::selectors::{SelectorSet, ADDRESS, POSTAL_ADDRESS};

pub const RECORD_KEY: &str = "supplier_id";
pub const IDENTIFIER: &str = "vat_number";
pub const COUNTRY_CODE: &str = "country_code";

/// `None` marks a missing value, distinct from an empty string.
pub type Cell = Option<String>;

/// Rows of one batch under a shared, ordered column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    /// Union of all row keys in first-seen order; absent keys become missing cells.
    pub fn from_rows(rows: Vec<IndexMap<String, Cell>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .map(|c| row.swap_remove(c).flatten())
                    .collect()
            })
            .collect();

        ResultTable { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Drop column `raw` and append `outputs`, each computed from that row's raw value.
    /// Nothing happens when `raw` is not a column.
    fn replace_column<F>(&mut self, raw: &str, outputs: &[&str], split: F)
    where
        F: Fn(Option<&str>) -> Vec<Cell>,
    {
        let Some(idx) = self.column_index(raw) else {
            return;
        };
        self.columns.remove(idx);
        self.columns.extend(outputs.iter().map(|c| c.to_string()));
        for row in &mut self.rows {
            let value = row.remove(idx);
            row.extend(split(value.as_deref()));
        }
        debug!(column = raw, rows = self.rows.len(), "Column normalized");
    }

    pub fn normalize_addresses(&mut self) {
        self.replace_column(ADDRESS, &address::COLUMNS, |raw| {
            normalize_address(raw).into_cells()
        });
    }

    pub fn normalize_postal_addresses(&mut self) {
        self.replace_column(POSTAL_ADDRESS, &postal::COLUMNS, |raw| {
            normalize_postal_address(raw).into_cells()
        });
    }
}

/// Build the batch table from found records and normalize whichever address fields
/// were collected.
pub fn assemble(
    records: Vec<FoundRecord>,
    selectors: &SelectorSet,
    include_country_code: bool,
) -> ResultTable {
    let rows = records
        .into_iter()
        .map(|record| {
            let mut row = IndexMap::new();
            row.insert(RECORD_KEY.to_string(), Some(record.record_key));
            row.insert(IDENTIFIER.to_string(), Some(record.identifier));
            if include_country_code {
                row.insert(
                    COUNTRY_CODE.to_string(),
                    Some(selectors.country_code.to_string()),
                );
            }
            row.extend(record.fields);
            row
        })
        .collect();

    let mut table = ResultTable::from_rows(rows);
    if !table.is_empty() && selectors.extracts(ADDRESS) {
        table.normalize_addresses();
    }
    if !table.is_empty() && selectors.extracts(POSTAL_ADDRESS) {
        table.normalize_postal_addresses();
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, Option<&str>)]) -> IndexMap<String, Cell> {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn column_union_fills_missing() {
        let t = ResultTable::from_rows(vec![
            row(&[("a", Some("1")), ("b", Some("2"))]),
            row(&[("a", Some("3")), ("c", Some(""))]),
        ]);
        assert_eq!(t.columns(), ["a", "b", "c"]);
        assert_eq!(t.get(1, "b"), None);
        assert_eq!(t.get(1, "c"), Some(""));
        assert_eq!(t.get(0, "c"), None);
    }

    #[test]
    fn address_replaced_by_parts_at_end() {
        let mut t = ResultTable::from_rows(vec![row(&[
            ("supplier_id", Some("A")),
            ("address", Some("Framing\nStorgata 1\n0123 Oslo")),
            ("municipality", Some("OSLO")),
        ])]);
        t.normalize_addresses();
        assert_eq!(
            t.columns(),
            ["supplier_id", "municipality", "street", "postal_code", "city"]
        );
        assert_eq!(t.get(0, "street"), Some("Storgata 1"));
        assert_eq!(t.get(0, "postal_code"), Some("0123"));
        assert_eq!(t.get(0, "city"), Some("Oslo"));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let mut t = ResultTable::from_rows(vec![row(&[(
            "postal_address",
            Some("Att: Jane Doe\nPostboks 100\n0456 Oslo"),
        )])]);
        t.normalize_postal_addresses();
        let once = t.clone();
        t.normalize_postal_addresses();
        assert_eq!(t, once);
        assert_eq!(t.get(0, "postal_att"), Some("Att: Jane Doe"));
        assert_eq!(t.get(0, "postal_postal_code"), Some("0456"));
    }

    #[test]
    fn assemble_empty_batch() {
        let selectors = SelectorSet::brreg("https://www.brreg.no/", &[]);
        let t = assemble(Vec::new(), &selectors, true);
        assert!(t.is_empty());
        assert!(t.columns().is_empty());
    }

    #[test]
    fn assemble_orders_leading_columns() {
        let selectors = SelectorSet::brreg("https://www.brreg.no/", &["address".into()]);
        let record = FoundRecord {
            record_key: "S-9".into(),
            identifier: "123456789".into(),
            fields: row(&[
                ("name", Some("ACME AS")),
                ("municipality", None),
                ("postal_address", Some("Postboks 1\n5003 Bergen")),
            ]),
        };
        let t = assemble(vec![record], &selectors, false);
        assert_eq!(
            t.columns(),
            [
                "supplier_id",
                "vat_number",
                "name",
                "municipality",
                "postal_att",
                "postal_street",
                "postal_postal_code",
                "postal_city"
            ]
        );
        assert_eq!(t.get(0, "municipality"), None);
        assert_eq!(t.get(0, "postal_city"), Some("Bergen"));
    }

    #[test]
    fn default_settings_add_no_country_code() {
        let selectors = SelectorSet::brreg("https://www.brreg.no/", &[]);
        let record = FoundRecord {
            record_key: "S-1".into(),
            identifier: "923609016".into(),
            fields: row(&[("name", Some("EQUINOR ASA"))]),
        };
        let include = crate::settings::Settings::default().include_country_code;
        let t = assemble(vec![record.clone()], &selectors, include);
        assert_eq!(t.columns(), ["supplier_id", "vat_number", "name"]);

        let t = assemble(vec![record], &selectors, true);
        assert_eq!(t.columns(), ["supplier_id", "vat_number", COUNTRY_CODE, "name"]);
        assert_eq!(t.get(0, COUNTRY_CODE), Some("NO"));
    }
}
