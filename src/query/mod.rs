//! Query descriptions and record matching.
//!
//! A [`Query`] maps field names to conditions. A record matches a query when
//! every condition holds:
//! - `Equals`: the normalized field value equals the normalized expected value
//! - `AnyOf`: the normalized field value equals any normalized candidate
//! - `Range`: the raw field value lies within the range

mod order;

pub use order::{Direction, OrderSpec, OrderTerm};
pub(crate) use order::sort_records;

use std::fmt;
use std::ops::{Bound, Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

use serde_json::Value;

use crate::error::{RelationError, RelationResult};
use crate::record::Record;
use crate::value::FieldValue;

/// Expected value for a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(FieldValue),
    AnyOf(Vec<FieldValue>),
    Range(FieldRange),
}

/// A range over field values, compared without normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRange {
    start: Bound<FieldValue>,
    end: Bound<FieldValue>,
}

impl FieldRange {
    pub fn new(start: Bound<FieldValue>, end: Bound<FieldValue>) -> Self {
        Self { start, end }
    }

    /// Whether `value` lies within the range. Incomparable values never do.
    pub fn contains(&self, value: &FieldValue) -> bool {
        let above_start = match &self.start {
            Bound::Included(start) => start.compare(value).is_some_and(|o| o.is_le()),
            Bound::Excluded(start) => start.compare(value).is_some_and(|o| o.is_lt()),
            Bound::Unbounded => true,
        };
        if !above_start {
            return false;
        }

        match &self.end {
            Bound::Included(end) => value.compare(end).is_some_and(|o| o.is_le()),
            Bound::Excluded(end) => value.compare(end).is_some_and(|o| o.is_lt()),
            Bound::Unbounded => true,
        }
    }
}

impl fmt::Display for FieldRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.start {
            Bound::Included(start) | Bound::Excluded(start) => write!(f, "{}", start)?,
            Bound::Unbounded => {}
        }
        match &self.end {
            Bound::Included(end) => write!(f, "..={}", end),
            Bound::Excluded(end) => write!(f, "..{}", end),
            Bound::Unbounded => f.write_str(".."),
        }
    }
}

impl<T: Into<FieldValue>> From<Range<T>> for FieldRange {
    fn from(range: Range<T>) -> Self {
        Self::new(
            Bound::Included(range.start.into()),
            Bound::Excluded(range.end.into()),
        )
    }
}

impl<T: Into<FieldValue>> From<RangeInclusive<T>> for FieldRange {
    fn from(range: RangeInclusive<T>) -> Self {
        let (start, end) = range.into_inner();
        Self::new(Bound::Included(start.into()), Bound::Included(end.into()))
    }
}

impl<T: Into<FieldValue>> From<RangeFrom<T>> for FieldRange {
    fn from(range: RangeFrom<T>) -> Self {
        Self::new(Bound::Included(range.start.into()), Bound::Unbounded)
    }
}

impl<T: Into<FieldValue>> From<RangeTo<T>> for FieldRange {
    fn from(range: RangeTo<T>) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(range.end.into()))
    }
}

impl<T: Into<FieldValue>> From<RangeToInclusive<T>> for FieldRange {
    fn from(range: RangeToInclusive<T>) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(range.end.into()))
    }
}

impl From<RangeFull> for FieldRange {
    fn from(_: RangeFull) -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }
}

/// A conjunction of field conditions.
///
/// Setting a condition on a field that already has one replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    conditions: Vec<(String, Condition)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value` after normalization.
    pub fn eq(self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.condition(field, Condition::Equals(value.into()))
    }

    /// Require `field` to equal any of `values` after normalization.
    pub fn any_of<I, T>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.condition(field, Condition::AnyOf(values))
    }

    /// Require `field` to lie within `range`.
    pub fn range(self, field: &str, range: impl Into<FieldRange>) -> Self {
        self.condition(field, Condition::Range(range.into()))
    }

    pub fn condition(mut self, field: &str, condition: Condition) -> Self {
        match self.conditions.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = condition,
            None => self.conditions.push((field.to_string(), condition)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(field, cond)| (field.as_str(), cond))
    }

    /// Parse a query from a JSON object.
    ///
    /// Arrays become `AnyOf`, objects with `from`/`to` keys become ranges
    /// (`"exclusive": true` excludes the end), everything else is `Equals`.
    pub fn from_json(value: &Value) -> RelationResult<Self> {
        let obj = value.as_object().ok_or_else(|| {
            RelationError::ArgumentError(format!("query must be a JSON object, got {}", value))
        })?;

        let mut query = Query::new();
        for (field, expected) in obj {
            let condition = match expected {
                Value::Array(items) => {
                    Condition::AnyOf(items.iter().map(FieldValue::from).collect())
                }
                Value::Object(range)
                    if range.contains_key("from") || range.contains_key("to") =>
                {
                    let start = match range.get("from") {
                        Some(from) if !from.is_null() => Bound::Included(FieldValue::from(from)),
                        _ => Bound::Unbounded,
                    };
                    let exclusive = range
                        .get("exclusive")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    let end = match range.get("to") {
                        Some(to) if !to.is_null() && exclusive => {
                            Bound::Excluded(FieldValue::from(to))
                        }
                        Some(to) if !to.is_null() => Bound::Included(FieldValue::from(to)),
                        _ => Bound::Unbounded,
                    };
                    Condition::Range(FieldRange::new(start, end))
                }
                other => Condition::Equals(FieldValue::from(other)),
            };
            query = query.condition(field, condition);
        }
        Ok(query)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, condition)) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            match condition {
                Condition::Equals(value) => write!(f, "{} = {}", field, value)?,
                Condition::AnyOf(values) => {
                    write!(f, "{} IN [", field)?;
                    for (j, value) in values.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", value)?;
                    }
                    f.write_str("]")?;
                }
                Condition::Range(range) => write!(f, "{} IN {}", field, range)?,
            }
        }
        Ok(())
    }
}

/// One step of a relation's filter: a query, optionally negated.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub query: Query,
    pub negated: bool,
}

impl Clause {
    pub fn accepts<R: Record>(&self, record: &R, id_field: &str) -> bool {
        matches(record, &self.query, id_field) != self.negated
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "NOT ({})", self.query)
        } else {
            write!(f, "{}", self.query)
        }
    }
}

/// Canonicalize a value before an equality comparison.
///
/// The identifier field coerces to an integer (non-numeric text gives 0),
/// text-like values become symbols, everything else is returned unchanged.
pub fn normalize(field: &str, value: &FieldValue, id_field: &str) -> FieldValue {
    if field == id_field {
        return FieldValue::Int(value.to_integer());
    }
    value.to_symbol().unwrap_or_else(|| value.clone())
}

/// Whether `record` satisfies every condition of `query`.
pub fn matches<R: Record>(record: &R, query: &Query, id_field: &str) -> bool {
    query.iter().all(|(field, condition)| {
        let actual = record.get(field);
        match condition {
            Condition::AnyOf(values) => {
                let actual = normalize(field, &actual, id_field);
                values
                    .iter()
                    .any(|val| actual == normalize(field, val, id_field))
            }
            Condition::Range(range) => range.contains(&actual),
            Condition::Equals(expected) => {
                normalize(field, &actual, id_field) == normalize(field, expected, id_field)
            }
        }
    })
}
