//! Order Tests
//!
//! Multi-key ordering with mixed directions, stability and argument errors.

mod common;

use common::{countries, ids, people, roster};
use hashrel::{Direction, OrderSpec, OrderTerm, Query, RecordType, RelationError};

#[test]
fn test_order_by_clause_string() {
    let people = people();
    let ordered = people.all().order("name, age DESC").unwrap();
    assert_eq!(ids(ordered), vec![1, 3, 2]);
}

#[test]
fn test_order_direction_is_case_insensitive() {
    let people = people();
    let upper = people.all().order("age DESC").unwrap();
    let lower = people.all().order("age desc").unwrap();
    assert_eq!(ids(upper), vec![1, 2, 3]);
    assert_eq!(ids(lower), vec![1, 2, 3]);

    let asc = people.all().order("age ASC").unwrap();
    assert_eq!(ids(asc), vec![3, 2, 1]);
}

#[test]
fn test_order_by_terms() {
    let countries = countries();
    let ordered = countries
        .all()
        .order(vec![
            OrderTerm::from(("language", Direction::Asc)),
            OrderTerm::from(("population", "DESC")),
        ])
        .unwrap();
    // English: US(331), Canada(38); Portuguese: Brazil; Spanish: Mexico(126), Chile(19)
    assert_eq!(ids(ordered), vec![1, 2, 5, 3, 4]);

    let ordered = countries.all().order(["name"]).unwrap();
    assert_eq!(ids(ordered), vec![5, 2, 4, 3, 1]);
}

#[test]
fn test_order_is_stable_for_ties() {
    let countries = countries();
    let ordered = countries.all().order("status").unwrap();
    // active first in original order, then inactive in original order
    assert_eq!(ids(ordered), vec![1, 2, 4, 3, 5]);

    let ordered = countries.all().order("status DESC").unwrap();
    assert_eq!(ids(ordered), vec![3, 5, 1, 2, 4]);
}

#[test]
fn test_order_respects_scope() {
    let countries = countries();
    let ordered = countries
        .all()
        .filter(Query::new().eq("status", "active"))
        .order(OrderTerm::desc("population"))
        .unwrap();
    assert_eq!(ids(ordered), vec![1, 2, 4]);
}

#[test]
fn test_order_on_symbol_fields() {
    let roster = roster();
    let ordered = roster.all().order("role, joined DESC").unwrap();
    let names: Vec<&str> = ordered.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["cy", "ada", "bob", "di"]);
}

#[test]
fn test_order_without_arguments_fails() {
    let people = people();
    let err = people
        .all()
        .order(OrderSpec::Terms(Vec::new()))
        .unwrap_err();
    assert!(matches!(err, RelationError::ArgumentError(_)));
    assert_eq!(err.to_string(), "The method .order() must contain arguments.");
}

#[test]
fn test_order_with_blank_clause_keeps_order() {
    let people = people();
    let ordered = people.all().order("").unwrap();
    assert_eq!(ids(ordered), vec![1, 2, 3]);
}

#[test]
fn test_order_does_not_touch_relation() {
    let countries = countries();
    let all = countries.all();
    let _ = all.order("population").unwrap();
    assert_eq!(ids(&all), vec![1, 2, 3, 4, 5]);
    assert_eq!(all.len(), countries.records().len());
}
