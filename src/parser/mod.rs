pub mod address;
pub mod postal;

pub use address::normalize_address;
pub use postal::normalize_postal_address;

/// Last `n` lines of a block, or every line if there are fewer.
fn last_lines<'a>(lines: &'a [&'a str], n: usize) -> &'a [&'a str] {
    &lines[lines.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_lines_of_short_block() {
        let lines = ["Postboks 1", "5003 Bergen"];
        assert_eq!(last_lines(&lines, 2), lines);
        assert_eq!(last_lines(&lines, 5), lines);
        assert_eq!(last_lines(&["Att", "Gate 1", "0123 Oslo"], 2), ["Gate 1", "0123 Oslo"]);
        assert!(last_lines(&[], 2).is_empty());
    }
}
