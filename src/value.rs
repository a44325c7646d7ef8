//! Field values exposed by records.
//!
//! A record field yields a [`FieldValue`]. Matching and ordering work purely
//! on the runtime tag of the value:
//! - numbers compare numerically across `Int` and `Float`
//! - `Text` and `Symbol` are distinct until normalized (see `query::normalize`)
//! - values of unrelated kinds are incomparable

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// A single field value of a record.
#[derive(Debug, Clone, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Interned token form of a textual value.
    Symbol(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Create a symbol value.
    pub fn symbol(name: impl Into<String>) -> Self {
        FieldValue::Symbol(name.into())
    }

    /// Short name of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Symbol(_) => "symbol",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(n) => Some(*n as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert a text-like value into its symbol form.
    ///
    /// Returns `None` for values that have no token representation.
    pub fn to_symbol(&self) -> Option<FieldValue> {
        match self {
            FieldValue::Text(s) | FieldValue::Symbol(s) => Some(FieldValue::Symbol(s.clone())),
            _ => None,
        }
    }

    /// Coerce the value to an integer.
    ///
    /// Text is parsed from its leading integer digits, so `"7"` and `"7th"`
    /// give 7 while `"abc"` gives 0. Floats are truncated. Values with no
    /// numeric reading (null, booleans, lists, maps) give 0.
    pub fn to_integer(&self) -> i64 {
        match self {
            FieldValue::Int(n) => *n,
            FieldValue::Float(f) if f.is_finite() => f.trunc() as i64,
            FieldValue::Text(s) | FieldValue::Symbol(s) => parse_leading_integer(s),
            _ => 0,
        }
    }

    /// Compare two values, returning `None` when they are not comparable.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => (a == b).then_some(Ordering::Equal),
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Int(_), FieldValue::Float(_))
            | (FieldValue::Float(_), FieldValue::Int(_))
            | (FieldValue::Float(_), FieldValue::Float(_)) => {
                let a = self.as_f64()?;
                let b = other.as_f64()?;
                a.partial_cmp(&b)
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Symbol(a), FieldValue::Symbol(b)) => Some(a.cmp(b)),
            (FieldValue::List(a), FieldValue::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (FieldValue::Map(a), FieldValue::Map(b)) => (a == b).then_some(Ordering::Equal),
            _ => None,
        }
    }

    /// Convert to a JSON value. Symbols become strings.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) | FieldValue::Symbol(s) => Value::String(s.clone()),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Parse the leading integer of a string the way a lenient `to_i` does:
/// optional whitespace, an optional sign, then digits (single underscores
/// allowed between digits). Stops at the first other character.
fn parse_leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut after_digit = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => {
                let digit = (c as u8 - b'0') as i64;
                value = value.saturating_mul(10).saturating_add(digit);
                after_digit = true;
            }
            '_' if after_digit => after_digit = false,
            _ => break,
        }
    }

    if negative {
        -value
    } else {
        value
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => a == b,
            (FieldValue::Int(a), FieldValue::Float(b)) | (FieldValue::Float(b), FieldValue::Int(a)) => {
                (*a as f64) == *b
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Symbol(a), FieldValue::Symbol(b)) => a == b,
            (FieldValue::List(a), FieldValue::List(b)) => a == b,
            (FieldValue::Map(a), FieldValue::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) | FieldValue::Symbol(s) => f.write_str(s),
            FieldValue::List(_) | FieldValue::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl serde::Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(items) => FieldValue::List(items.iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::from(&value)
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        value.to_json()
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(n as i64)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Int(n as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::Text(s.clone())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_equality_across_kinds() {
        assert_eq!(FieldValue::Int(1), FieldValue::Float(1.0));
        assert_ne!(FieldValue::Int(1), FieldValue::Float(1.5));
        assert_ne!(FieldValue::Int(1), FieldValue::from("1"));
    }

    #[test]
    fn test_text_and_symbol_differ_until_converted() {
        let text = FieldValue::from("active");
        let sym = FieldValue::symbol("active");
        assert_ne!(text, sym);
        assert_eq!(text.to_symbol(), Some(sym.clone()));
        assert_eq!(sym.to_symbol(), Some(sym));
        assert_eq!(FieldValue::Int(3).to_symbol(), None);
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(FieldValue::from("7").to_integer(), 7);
        assert_eq!(FieldValue::from("  -12abc").to_integer(), -12);
        assert_eq!(FieldValue::from("+5").to_integer(), 5);
        assert_eq!(FieldValue::from("1_000").to_integer(), 1000);
        assert_eq!(FieldValue::from("1__0").to_integer(), 1);
        assert_eq!(FieldValue::from("abc").to_integer(), 0);
        assert_eq!(FieldValue::from("").to_integer(), 0);
        assert_eq!(FieldValue::Float(3.9).to_integer(), 3);
        assert_eq!(FieldValue::Float(f64::NAN).to_integer(), 0);
        assert_eq!(FieldValue::Null.to_integer(), 0);
        assert_eq!(FieldValue::Bool(true).to_integer(), 0);
    }

    #[test]
    fn test_compare() {
        assert_eq!(FieldValue::Int(1).compare(&FieldValue::Int(2)), Some(Ordering::Less));
        assert_eq!(
            FieldValue::Float(2.5).compare(&FieldValue::Int(2)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            FieldValue::from("a").compare(&FieldValue::from("b")),
            Some(Ordering::Less)
        );
        assert_eq!(FieldValue::Null.compare(&FieldValue::Null), Some(Ordering::Equal));
        assert_eq!(FieldValue::Null.compare(&FieldValue::Int(1)), None);
        assert_eq!(FieldValue::from("a").compare(&FieldValue::symbol("a")), None);
        assert_eq!(FieldValue::Bool(true).compare(&FieldValue::Bool(false)), None);
        assert_eq!(
            FieldValue::from(vec![1, 2]).compare(&FieldValue::from(vec![1, 3])),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::from(vec![1, 2]).compare(&FieldValue::from(vec![1])),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Int(7).to_string(), "7");
        assert_eq!(FieldValue::Float(7.0).to_string(), "7.0");
        assert_eq!(FieldValue::Float(7.25).to_string(), "7.25");
        assert_eq!(FieldValue::symbol("us").to_string(), "us");
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::from(vec![1, 2]).to_string(), "[1,2]");
    }

    #[test]
    fn test_json_conversion() {
        let value = FieldValue::from(&json!({"a": [1, 2.5, "x", null, true]}));
        let expected: BTreeMap<String, FieldValue> = [(
            "a".to_string(),
            FieldValue::List(vec![
                FieldValue::Int(1),
                FieldValue::Float(2.5),
                FieldValue::from("x"),
                FieldValue::Null,
                FieldValue::Bool(true),
            ]),
        )]
        .into_iter()
        .collect();
        assert_eq!(value, FieldValue::Map(expected));
        assert_eq!(value.to_json(), json!({"a": [1, 2.5, "x", null, true]}));
        assert_eq!(FieldValue::symbol("us").to_json(), json!("us"));
    }
}
