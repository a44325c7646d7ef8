//! Ordering of materialized records.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{RelationError, RelationResult};
use crate::record::Record;
use crate::value::FieldValue;

/// Sort direction for a single key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// `DESC` in any case means descending; anything else is ascending.
    pub fn parse(token: &str) -> Self {
        if token.eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub direction: Direction,
}

impl OrderTerm {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Desc,
        }
    }
}

impl From<&str> for OrderTerm {
    fn from(field: &str) -> Self {
        OrderTerm::asc(field)
    }
}

impl From<(&str, Direction)> for OrderTerm {
    fn from((field, direction): (&str, Direction)) -> Self {
        Self {
            field: field.to_string(),
            direction,
        }
    }
}

impl From<(&str, &str)> for OrderTerm {
    fn from((field, direction): (&str, &str)) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::parse(direction),
        }
    }
}

/// Arguments to `Relation::order`.
///
/// Either a delimited clause such as `"name, age DESC"` or explicit terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
    Clause(String),
    Terms(Vec<OrderTerm>),
}

impl OrderSpec {
    /// Resolve to sort keys, most significant first.
    ///
    /// An empty term list is an argument error. A blank clause is an
    /// argument, it just yields no keys.
    pub fn terms(&self) -> RelationResult<Vec<OrderTerm>> {
        match self {
            OrderSpec::Terms(terms) if terms.is_empty() => {
                Err(RelationError::missing_arguments("order"))
            }
            OrderSpec::Terms(terms) => Ok(terms.clone()),
            OrderSpec::Clause(clause) => Ok(parse_clause(clause)),
        }
    }
}

impl From<&str> for OrderSpec {
    fn from(clause: &str) -> Self {
        OrderSpec::Clause(clause.to_string())
    }
}

impl From<String> for OrderSpec {
    fn from(clause: String) -> Self {
        OrderSpec::Clause(clause)
    }
}

impl From<OrderTerm> for OrderSpec {
    fn from(term: OrderTerm) -> Self {
        OrderSpec::Terms(vec![term])
    }
}

impl<T: Into<OrderTerm>> From<Vec<T>> for OrderSpec {
    fn from(terms: Vec<T>) -> Self {
        OrderSpec::Terms(terms.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<OrderTerm>, const N: usize> From<[T; N]> for OrderSpec {
    fn from(terms: [T; N]) -> Self {
        OrderSpec::Terms(terms.into_iter().map(Into::into).collect())
    }
}

fn token_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    // dots stay inside tokens so nested paths like `address.city` survive
    SEPARATOR.get_or_init(|| Regex::new(r"[^\w.]+").expect("token separator pattern is valid"))
}

/// Split `"name, age DESC"` into terms. Each comma-separated piece is split
/// on non-word characters into a field and an optional direction.
fn parse_clause(clause: &str) -> Vec<OrderTerm> {
    clause
        .split(',')
        .filter_map(|piece| {
            let mut tokens = token_separator()
                .split(piece)
                .filter(|token| !token.is_empty());
            let field = tokens.next()?;
            let direction = tokens.next().map(Direction::parse).unwrap_or_default();
            Some(OrderTerm {
                field: field.to_string(),
                direction,
            })
        })
        .collect()
}

/// Sort `records` by `terms`, first term most significant.
///
/// Applies one stable single-key pass per term, least significant term
/// first. Records equal on every key keep their relative order.
pub(crate) fn sort_records<R: Record>(
    records: &mut Vec<&R>,
    terms: &[OrderTerm],
) -> RelationResult<()> {
    for term in terms.iter().rev() {
        let mut keyed: Vec<(FieldValue, &R)> = records
            .iter()
            .map(|record| (record.get(&term.field), *record))
            .collect();

        let mut failure: Option<(&'static str, &'static str)> = None;
        keyed.sort_by(|(a, _), (b, _)| {
            let (left, right) = match term.direction {
                Direction::Asc => (a, b),
                Direction::Desc => (b, a),
            };
            left.compare(right).unwrap_or_else(|| {
                failure.get_or_insert((left.type_name(), right.type_name()));
                Ordering::Equal
            })
        });

        if let Some((left, right)) = failure {
            return Err(RelationError::ArgumentError(format!(
                "comparison of {} with {} failed",
                left, right
            )));
        }

        *records = keyed.into_iter().map(|(_, record)| record).collect();
    }
    Ok(())
}
