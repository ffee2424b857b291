use super::last_lines;

pub const COLUMNS: [&str; 4] = [
    "postal_att",
    "postal_street",
    "postal_postal_code",
    "postal_city",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostalAddress {
    pub att: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

impl PostalAddress {
    pub fn into_cells(self) -> Vec<Option<String>> {
        vec![self.att, self.street, self.postal_code, self.city]
    }
}

/// Split a rendered postal address into attention line, street, postal code and city.
///
/// Blocks are two lines ("<street>", "<code> <city>") or three with a leading
/// attention line. Only the first two tokens of the code/city line are read, so a
/// city name with spaces keeps its first word only.
pub fn normalize_postal_address(raw: Option<&str>) -> PostalAddress {
    let Some(raw) = raw else {
        return PostalAddress::default();
    };

    let lines: Vec<&str> = raw.split('\n').collect();
    let att = (lines.len() == 3).then(|| lines[0].to_string());

    let joined = last_lines(&lines, 2).join(",");
    let mut parts = joined.split(',');
    let street = parts.next().map(str::to_string);
    let remaining = parts.next();

    let mut tokens = remaining.map(|r| r.split(' ')).into_iter().flatten();
    let postal_code = tokens.next().map(str::to_string);
    let city = tokens.next().map(str::to_string);

    PostalAddress {
        att,
        street,
        postal_code,
        city,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_lines_with_attention() {
        let p = normalize_postal_address(Some("Att: Jane Doe\nPostboks 100\n0456 Oslo"));
        assert_eq!(p.att.as_deref(), Some("Att: Jane Doe"));
        assert_eq!(p.street.as_deref(), Some("Postboks 100"));
        assert_eq!(p.postal_code.as_deref(), Some("0456"));
        assert_eq!(p.city.as_deref(), Some("Oslo"));
    }

    #[test]
    fn two_lines_without_attention() {
        let p = normalize_postal_address(Some("Postboks 100\n0456 Oslo"));
        assert_eq!(p.att, None);
        assert_eq!(p.street.as_deref(), Some("Postboks 100"));
        assert_eq!(p.postal_code.as_deref(), Some("0456"));
        assert_eq!(p.city.as_deref(), Some("Oslo"));
    }

    #[test]
    fn extra_city_words_are_dropped() {
        let p = normalize_postal_address(Some("Postboks 7\n8622 Mo i Rana"));
        assert_eq!(p.postal_code.as_deref(), Some("8622"));
        assert_eq!(p.city.as_deref(), Some("Mo"));
    }

    #[test]
    fn four_lines_have_no_attention_line() {
        let p = normalize_postal_address(Some("Firma AS\nc/o Someone\nPostboks 1\n5003 Bergen"));
        assert_eq!(p.att, None);
        assert_eq!(p.street.as_deref(), Some("Postboks 1"));
        assert_eq!(p.city.as_deref(), Some("Bergen"));
    }

    #[test]
    fn single_line_leaves_trailing_columns_missing() {
        let p = normalize_postal_address(Some("Postboks 100"));
        assert_eq!(p.att, None);
        assert_eq!(p.street.as_deref(), Some("Postboks 100"));
        assert_eq!(p.postal_code, None);
        assert_eq!(p.city, None);
    }

    #[test]
    fn comma_in_street_shifts_columns() {
        let p = normalize_postal_address(Some("Bygg 2, Postboks 9\n0456 Oslo"));
        assert_eq!(p.street.as_deref(), Some("Bygg 2"));
        assert_eq!(p.postal_code.as_deref(), Some(""));
        assert_eq!(p.city.as_deref(), Some("Postboks"));
    }

    #[test]
    fn missing_value_stays_missing() {
        assert_eq!(normalize_postal_address(None), PostalAddress::default());
    }
}
