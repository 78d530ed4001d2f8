//! Cell value types

use std::fmt;

/// Represents the computed value of a cell
#[derive(Debug, Clone, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE), produced by comparisons and logical functions
    Boolean(bool),

    /// Numeric value (all numbers stored as f64)
    Number(f64),

    /// Text value
    Text(String),

    /// Error marker (#DIV/0!, #CYCLE!, etc.)
    Error(CellError),
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Coerce literal (non-formula) input: a number when the whole trimmed input is a
    /// finite decimal number, `Empty` for the empty string, the raw text otherwise.
    ///
    /// # Examples
    /// ```
    /// use cellgraph_core::CellValue;
    ///
    /// assert_eq!(CellValue::from_literal("42"), CellValue::Number(42.0));
    /// assert_eq!(CellValue::from_literal(" 1.5e3 "), CellValue::Number(1500.0));
    /// assert_eq!(CellValue::from_literal("12abc"), CellValue::text("12abc"));
    /// assert_eq!(CellValue::from_literal("inf"), CellValue::text("inf"));
    /// assert_eq!(CellValue::from_literal(""), CellValue::Empty);
    /// ```
    pub fn from_literal(raw: &str) -> Self {
        if raw.is_empty() {
            return CellValue::Empty;
        }
        match parse_number(raw) {
            Some(n) => CellValue::Number(n),
            None => CellValue::Text(raw.to_string()),
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains an error
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Get the error if this is one
    pub fn error(&self) -> Option<CellError> {
        match self {
            CellValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Try to get the value as a number
    ///
    /// Text is converted only when it is entirely numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(true) => Some(1.0),
            CellValue::Boolean(false) => Some(0.0),
            CellValue::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// The string shown in the grid for this value
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Boolean(true) => "TRUE".to_string(),
            CellValue::Boolean(false) => "FALSE".to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Error(e) => e.as_str().to_string(),
        }
    }

    /// Get the type name (for debugging/error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Error(_) => "error",
        }
    }
}

/// Strict equality, except that NaN equals itself so a recalculation that
/// reproduces the same value never looks like a change.
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::Boolean(a), CellValue::Boolean(b)) => a == b,
            (CellValue::Number(a), CellValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Error(a), CellValue::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Parse text that is entirely a finite decimal number (surrounding whitespace allowed).
///
/// Rejects the words `inf`, `infinity` and `nan` that `f64::from_str` would accept.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty()
        || !text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-' | b'e' | b'E'))
    {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Format a number the way JavaScript's `String(number)` does.
///
/// # Examples
/// ```
/// use cellgraph_core::format_number;
///
/// assert_eq!(format_number(20.0), "20");
/// assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
/// assert_eq!(format_number(1e21), "1e+21");
/// assert_eq!(format_number(1.5e-7), "1.5e-7");
/// ```
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // Also covers -0
        return "0".to_string();
    }

    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        let s = format!("{:e}", n);
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        };
    }

    format!("{}", n)
}

/// Cell error markers, displayed verbatim in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #ERROR! - Formula could not be parsed
    Error,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized function or name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available (wrong argument count)
    Na,
    /// #CYCLE! - Circular reference
    Cycle,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Error => "#ERROR!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::Cycle => "#CYCLE!",
        }
    }

    /// Parse an error string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#ERROR!" => Some(CellError::Error),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            "#CYCLE!" => Some(CellError::Cycle),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    //! Persisted values are plain JSON scalars: numbers, booleans, and strings
    //! (error markers as their display text, `""` for empty).

    use super::{CellError, CellValue};
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    impl Serialize for CellValue {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                CellValue::Empty => serializer.serialize_str(""),
                CellValue::Boolean(b) => serializer.serialize_bool(*b),
                CellValue::Number(n) => serializer.serialize_f64(*n),
                CellValue::Text(s) => serializer.serialize_str(s),
                CellValue::Error(e) => serializer.serialize_str(e.as_str()),
            }
        }
    }

    struct CellValueVisitor;

    impl<'de> Visitor<'de> for CellValueVisitor {
        type Value = CellValue;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number, string, boolean or null")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<CellValue, E> {
            Ok(CellValue::Boolean(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<CellValue, E> {
            Ok(CellValue::Number(v as f64))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<CellValue, E> {
            Ok(CellValue::Number(v as f64))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<CellValue, E> {
            Ok(CellValue::Number(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<CellValue, E> {
            Ok(if v.is_empty() {
                CellValue::Empty
            } else if let Some(err) = CellError::from_str(v) {
                CellValue::Error(err)
            } else {
                CellValue::Text(v.to_string())
            })
        }

        fn visit_unit<E: de::Error>(self) -> Result<CellValue, E> {
            Ok(CellValue::Empty)
        }

        fn visit_none<E: de::Error>(self) -> Result<CellValue, E> {
            Ok(CellValue::Empty)
        }
    }

    impl<'de> Deserialize<'de> for CellValue {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(CellValueVisitor)
        }
    }
}
