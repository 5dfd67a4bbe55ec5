//! Header-row delimited table parsing

use crate::models::CsvRow;
use csv::{ReaderBuilder, Trim};

/// Parse a header-row table into rows keyed by header
///
/// Short rows are allowed (missing trailing columns are simply absent)
/// and fully blank rows are skipped. Extra cells beyond the header are
/// dropped.
pub fn parse_table(text: &str) -> Result<Vec<CsvRow>, csv::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        rows.push(CsvRow::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (header.to_string(), value.to_string())),
        ));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quoted_fields_and_commas() {
        let rows = parse_table(
            "id,permalink,date,title\n\
             a1,https://www.reddit.com/r/rust/comments/a1/,2025-01-02 10:00:00 UTC,\"Hello, world\"\n",
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("title"), Some("Hello, world"));
        assert_eq!(rows[0].get("id"), Some("a1"));
    }

    #[test]
    fn test_blank_rows_skipped_and_short_rows_allowed() {
        let rows = parse_table("id,permalink,date\na1,,\n\n,,\na2\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("id"), Some("a2"));
        assert_eq!(rows[1].get("date"), None);
    }

    #[test]
    fn test_byte_order_mark_stripped_from_first_header() {
        let rows = parse_table("\u{feff}id,direction\nx,up\n").unwrap();
        assert_eq!(rows[0].get("id"), Some("x"));
    }

    #[test]
    fn test_multiline_quoted_body() {
        let rows = parse_table("id,body\nc1,\"line one\nline two\"\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("body"), Some("line one\nline two"));
    }

    #[test]
    fn test_header_only_table_is_empty() {
        assert!(parse_table("id,permalink,date\n").unwrap().is_empty());
        assert!(parse_table("").unwrap().is_empty());
    }
}
