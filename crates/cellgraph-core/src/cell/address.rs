//! Cell address and range types
//!
//! The address codec converts between A1-style text (column letters followed by a
//! 1-based row number) and zero-based `(row, col)` indices. Columns are an unbounded
//! base-26 letter sequence (A=0, Z=25, AA=26, ...) limited only by `u32`.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Parse an A1-style address into zero-based `(row, col)` indices.
///
/// The input must match `[A-Z]+[0-9]+` exactly and the row number must be at least 1.
///
/// # Examples
/// ```
/// use cellgraph_core::to_index;
///
/// assert_eq!(to_index("A1").unwrap(), (0, 0));
/// assert_eq!(to_index("ZZ10").unwrap(), (9, 701));
/// assert!(to_index("a1").is_err());
/// assert!(to_index("A0").is_err());
/// ```
pub fn to_index(address: &str) -> Result<(u32, u32)> {
    let bytes = address.as_bytes();
    let split = bytes
        .iter()
        .position(|b| !b.is_ascii_uppercase())
        .unwrap_or(bytes.len());

    if split == 0 {
        return Err(Error::InvalidAddress(format!(
            "no column letters in '{}'",
            address
        )));
    }

    let (letters, digits) = address.split_at(split);
    if digits.is_empty() {
        return Err(Error::InvalidAddress(format!(
            "no row number in '{}'",
            address
        )));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAddress(format!(
            "unexpected characters in '{}'",
            address
        )));
    }

    let col = letters_to_column(letters)?;

    let row: u64 = digits
        .parse()
        .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", address)))?;

    // Text rows are 1-based, we use 0-based internally
    if row == 0 {
        return Err(Error::InvalidAddress(format!(
            "row number must be >= 1 in '{}'",
            address
        )));
    }
    let row = u32::try_from(row - 1)
        .map_err(|_| Error::InvalidAddress(format!("row number too large in '{}'", address)))?;

    Ok((row, col))
}

/// Format zero-based `(row, col)` indices as an A1-style address.
///
/// Inverse of [`to_index`] for every `row`/`col` in `u32`.
pub fn to_address(row: u32, col: u32) -> String {
    format!("{}{}", column_to_letters(col), row as u64 + 1)
}

/// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
pub fn column_to_letters(col: u32) -> String {
    let mut result = Vec::new();
    let mut n = col as u64 + 1; // 1-based for calculation

    while n > 0 {
        n -= 1;
        result.push((n % 26) as u8 + b'A');
        n /= 26;
    }

    result.reverse();
    // Only ASCII uppercase letters were pushed
    result.into_iter().map(char::from).collect()
}

/// Convert uppercase column letters to index (A = 0, Z = 25, AA = 26, etc.)
pub fn letters_to_column(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidAddress("empty column letters".into()));
    }

    let mut col: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        col = col
            .checked_mul(26)
            .and_then(|v| v.checked_add(c as u64 - 'A' as u64 + 1))
            .ok_or_else(|| Error::InvalidAddress(format!("column too large: '{}'", letters)))?;
    }

    u32::try_from(col - 1)
        .map_err(|_| Error::InvalidAddress(format!("column too large: '{}'", letters)))
}

/// A cell address (e.g., "A1", "AA10")
///
/// Ordered row-major so that maps keyed by address iterate top-to-bottom, left-to-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ...)
    pub col: u32,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use cellgraph_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B2").unwrap();
    /// assert_eq!(addr.row, 1);
    /// assert_eq!(addr.col, 1);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let (row, col) = to_index(s)?;
        Ok(Self { row, col })
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        to_address(self.row, self.col)
    }

    /// Create a range from this address to another
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row as u64 + 1)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CellAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CellAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        CellAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A range of cells (e.g., "A1:B10")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range, normalized so start is top-left and end is bottom-right
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self {
            start: CellAddress::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellAddress::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse a range from A1:B10 notation
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((start, end)) => {
                let start = CellAddress::parse(start)
                    .map_err(|e| Error::InvalidRange(format!("'{}': {}", s, e)))?;
                let end = CellAddress::parse(end)
                    .map_err(|e| Error::InvalidRange(format!("'{}': {}", s, e)))?;
                Ok(Self::new(start, end))
            }
            None => Ok(Self::single(CellAddress::parse(s)?)),
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u64 {
        (self.end.row - self.start.row) as u64 + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u64 {
        (self.end.col - self.start.col) as u64 + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count().saturating_mul(self.col_count())
    }

    /// Iterate over all cell addresses in the range (row by row)
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            next: Some(self.start),
        }
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start, self.end)
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in a range
pub struct CellRangeIterator {
    range: CellRange,
    next: Option<CellAddress>,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        self.next = if current.col < self.range.end.col {
            Some(CellAddress::new(current.row, current.col + 1))
        } else if current.row < self.range.end.row {
            Some(CellAddress::new(current.row + 1, self.range.start.col))
        } else {
            None
        };

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(column_to_letters(0), "A");
        assert_eq!(column_to_letters(1), "B");
        assert_eq!(column_to_letters(25), "Z");
        assert_eq!(column_to_letters(26), "AA");
        assert_eq!(column_to_letters(27), "AB");
        assert_eq!(column_to_letters(701), "ZZ");
        assert_eq!(column_to_letters(702), "AAA");
        assert_eq!(column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(letters_to_column("A").unwrap(), 0);
        assert_eq!(letters_to_column("Z").unwrap(), 25);
        assert_eq!(letters_to_column("AA").unwrap(), 26);
        assert_eq!(letters_to_column("ZZ").unwrap(), 701);
        assert_eq!(letters_to_column("AAA").unwrap(), 702);
        assert_eq!(letters_to_column("XFD").unwrap(), 16383);

        assert!(letters_to_column("").is_err());
        assert!(letters_to_column("a").is_err());
    }

    #[test]
    fn test_to_index() {
        assert_eq!(to_index("A1").unwrap(), (0, 0));
        assert_eq!(to_index("B2").unwrap(), (1, 1));
        assert_eq!(to_index("C100").unwrap(), (99, 2));
        assert_eq!(to_index("XFD1048576").unwrap(), (1048575, 16383));
        // Columns are not capped at the Excel limit
        assert_eq!(to_index("XFE1").unwrap(), (0, 16384));
    }

    #[test]
    fn test_to_index_errors() {
        for bad in ["", "A", "1", "A0", "a1", "$A$1", "A1B", " A1", "A1 ", "A-1", "1A"] {
            assert!(
                matches!(to_index(bad), Err(Error::InvalidAddress(_))),
                "expected InvalidAddress for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_to_index_overflow_is_error() {
        let huge_col = format!("{}1", "Z".repeat(40));
        assert!(to_index(&huge_col).is_err());
        assert!(to_index("A99999999999").is_err());
    }

    #[test]
    fn test_extreme_indices_round_trip() {
        let text = to_address(u32::MAX, u32::MAX);
        assert_eq!(to_index(&text).unwrap(), (u32::MAX, u32::MAX));
    }

    #[test]
    fn test_cell_address_display() {
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
        assert_eq!(CellAddress::new(99, 2).to_string(), "C100");
        assert_eq!("AB7".parse::<CellAddress>().unwrap(), CellAddress::new(6, 27));
    }

    #[test]
    fn test_cell_address_ordering_is_row_major() {
        let mut addrs = vec![
            CellAddress::parse("B1").unwrap(),
            CellAddress::parse("A2").unwrap(),
            CellAddress::parse("A1").unwrap(),
        ];
        addrs.sort();
        let names: Vec<String> = addrs.iter().map(|a| a.to_string()).collect();
        assert_eq!(names, vec!["A1", "B1", "A2"]);
    }

    #[test]
    fn test_cell_range_parse() {
        let range = CellRange::parse("B2:A1").unwrap();
        assert_eq!(range.start, CellAddress::new(0, 0));
        assert_eq!(range.end, CellAddress::new(1, 1));

        let range = CellRange::parse("C3").unwrap();
        assert_eq!(range.start, range.end);

        assert!(matches!(CellRange::parse("A1:"), Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_cell_range_iterator() {
        let range = CellRange::parse("A1:B2").unwrap();
        let cells: Vec<_> = range.cells().collect();

        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], CellAddress::new(0, 0)); // A1
        assert_eq!(cells[1], CellAddress::new(0, 1)); // B1
        assert_eq!(cells[2], CellAddress::new(1, 0)); // A2
        assert_eq!(cells[3], CellAddress::new(1, 1)); // B2
        assert_eq!(range.cell_count(), 4);
        assert!(range.contains(&CellAddress::new(1, 0)));
        assert!(!range.contains(&CellAddress::new(2, 0)));
    }

    proptest! {
        #[test]
        fn prop_address_round_trip(row in 0u32..1000, col in 0u32..701) {
            prop_assert_eq!(to_index(&to_address(row, col)).unwrap(), (row, col));
        }

        #[test]
        fn prop_address_round_trip_any(row in any::<u32>(), col in any::<u32>()) {
            let addr = CellAddress::new(row, col);
            prop_assert_eq!(CellAddress::parse(&addr.to_string()).unwrap(), addr);
        }
    }
}
