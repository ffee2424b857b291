use super::last_lines;

pub const COLUMNS: [&str; 3] = ["street", "postal_code", "city"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

impl Address {
    pub fn into_cells(self) -> Vec<Option<String>> {
        vec![self.street, self.postal_code, self.city]
    }
}

/// Split a rendered address block into street, postal code and city.
///
/// Only the last two lines matter ("<street>" and "<code> <city>"); the page puts
/// company framing above them. The two lines are joined with a space and then read
/// right to left: last token is the city, the one before it the postal code, and
/// whatever precedes them is the street.
pub fn normalize_address(raw: Option<&str>) -> Address {
    let Some(raw) = raw else {
        return Address::default();
    };

    let lines: Vec<&str> = raw.split('\n').collect();
    let joined = last_lines(&lines, 2).join(" ");
    let tokens: Vec<&str> = joined.split(' ').collect();

    let n = tokens.len();
    let city = tokens.last().map(|s| s.to_string());
    let postal_code = n.checked_sub(2).map(|i| tokens[i].to_string());
    let street = tokens[..n.saturating_sub(2)].join(" ");

    Address {
        street: Some(street),
        postal_code,
        city,
    }
}
