//! A1-style grid addressing.
//!
//! Rows are 1-based, columns are lettered `A..Z, AA..ZZ, AAA..` with no zero
//! digit. A range spec is either a bare table name (the whole table) or
//! `Table!A1` / `Table!A2:D2`.

/// Converts a zero-based column index to its letters (0 -> `A`, 26 -> `AA`).
///
/// Negative indices degrade to `A`.
pub fn column_letter(index: i64) -> String {
    if index < 0 {
        return "A".to_string();
    }

    let mut letters = String::new();
    let mut n = index;
    while n >= 0 {
        letters.insert(0, char::from(b'A' + (n % 26) as u8));
        n = n / 26 - 1;
    }
    letters
}

/// Converts column letters back to a zero-based index.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index: usize = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let digit = (b.to_ascii_uppercase() - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// Range covering columns `A..` of one absolute (1-based) row, `width` cells wide.
pub fn row_range(table: &str, row: usize, width: usize) -> String {
    let end = column_letter(width as i64 - 1);
    format!("{}!A{}:{}{}", table, row, end, row)
}

/// Anchor used when appending rows to a table.
pub fn append_anchor(table: &str) -> String {
    format!("{}!A1", table)
}

/// A single cell address (zero-based column, 1-based row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub column: usize,
    pub row: usize,
}

impl CellRef {
    /// Parses `B7` style references.
    pub fn parse(s: &str) -> Option<Self> {
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = s.split_at(split);
        let column = column_index(letters)?;
        let row: usize = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self { column, row })
    }
}

/// A parsed range spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub table: String,
    pub start: Option<CellRef>,
    pub end: Option<CellRef>,
}

impl A1Range {
    /// Parses `Table`, `Table!A1` and `Table!A2:D2`.
    pub fn parse(spec: &str) -> Option<Self> {
        let Some((table, cells)) = spec.rsplit_once('!') else {
            if spec.is_empty() {
                return None;
            }
            return Some(Self {
                table: spec.to_string(),
                start: None,
                end: None,
            });
        };

        if table.is_empty() {
            return None;
        }

        let (start, end) = match cells.split_once(':') {
            Some((a, b)) => (CellRef::parse(a)?, Some(CellRef::parse(b)?)),
            None => (CellRef::parse(cells)?, None),
        };

        Some(Self {
            table: table.to_string(),
            start: Some(start),
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(1), "B");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_column_letter_negative_is_a() {
        assert_eq!(column_letter(-1), "A");
        assert_eq!(column_letter(-100), "A");
    }

    #[test]
    fn test_column_index_inverts_letter() {
        for i in [0usize, 1, 25, 26, 27, 51, 52, 701, 702, 18_277] {
            assert_eq!(column_index(&column_letter(i as i64)), Some(i));
        }
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_row_range() {
        assert_eq!(row_range("Users", 2, 4), "Users!A2:D2");
        assert_eq!(row_range("Users", 10, 27), "Users!A10:AA10");
        assert_eq!(row_range("Users", 3, 0), "Users!A3:A3");
    }

    #[test]
    fn test_parse_whole_table() {
        let range = A1Range::parse("Users").unwrap();
        assert_eq!(range.table, "Users");
        assert!(range.start.is_none());
        assert!(range.end.is_none());
    }

    #[test]
    fn test_parse_rectangle() {
        let range = A1Range::parse("Users!A2:D2").unwrap();
        assert_eq!(range.table, "Users");
        assert_eq!(range.start, Some(CellRef { column: 0, row: 2 }));
        assert_eq!(range.end, Some(CellRef { column: 3, row: 2 }));
    }

    #[test]
    fn test_parse_anchor() {
        let range = A1Range::parse(&append_anchor("Users")).unwrap();
        assert_eq!(range.start, Some(CellRef { column: 0, row: 1 }));
        assert!(range.end.is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(A1Range::parse("").is_none());
        assert!(A1Range::parse("!A1").is_none());
        assert!(A1Range::parse("Users!A0").is_none());
        assert!(A1Range::parse("Users!11").is_none());
    }
}
