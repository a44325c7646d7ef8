//! Common fixtures for relation tests
//!
//! Provides:
//! - A JSON-backed `Collection` of people
//! - A typed `Roster` record type implementing `RecordType` by hand

#![allow(dead_code)]

use std::collections::HashMap;

use hashrel::{index_key, Collection, FieldValue, Record, RecordType};
use serde_json::json;

pub fn people() -> Collection {
    Collection::from_json(
        "Person",
        "id",
        json!([
            {"id": 1, "name": "A", "age": 30},
            {"id": 2, "name": "B", "age": 25},
            {"id": 3, "name": "A", "age": 20}
        ]),
    )
    .unwrap()
}

pub fn countries() -> Collection {
    Collection::from_json(
        "Country",
        "id",
        json!([
            {"id": 1, "name": "US", "status": "active", "population": 331, "language": "English"},
            {"id": 2, "name": "Canada", "status": "active", "population": 38, "language": "English"},
            {"id": 3, "name": "Mexico", "status": "inactive", "population": 126, "language": "Spanish"},
            {"id": 4, "name": "Chile", "status": "active", "population": 19, "language": "Spanish"},
            {"id": 5, "name": "Brazil", "status": "inactive", "population": 214, "language": "Portuguese"}
        ]),
    )
    .unwrap()
}

pub fn ids<'a, R: Record + 'a>(records: impl IntoIterator<Item = &'a R>) -> Vec<i64> {
    records
        .into_iter()
        .map(|r| r.get("id").to_integer())
        .collect()
}

/// A hand-written record with a symbol-valued field.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub joined: i64,
}

impl Record for Member {
    fn get(&self, field: &str) -> FieldValue {
        match field {
            "id" => FieldValue::Int(self.id),
            "name" => FieldValue::from(&self.name),
            "role" => FieldValue::symbol(&self.role),
            "joined" => FieldValue::Int(self.joined),
            _ => FieldValue::Null,
        }
    }
}

pub struct Roster {
    members: Vec<Member>,
    index: HashMap<String, usize>,
}

impl Roster {
    pub fn new(members: Vec<Member>) -> Self {
        let index = members
            .iter()
            .enumerate()
            .map(|(position, member)| (index_key(&FieldValue::Int(member.id)), position))
            .collect();
        Self { members, index }
    }
}

impl RecordType for Roster {
    type Record = Member;

    fn type_name(&self) -> &str {
        "Member"
    }

    fn records(&self) -> &[Member] {
        &self.members
    }

    fn record_index(&self) -> &HashMap<String, usize> {
        &self.index
    }
}

pub fn roster() -> Roster {
    let member = |id: i64, name: &str, role: &str, joined: i64| Member {
        id,
        name: name.to_string(),
        role: role.to_string(),
        joined,
    };
    Roster::new(vec![
        member(10, "ada", "admin", 2019),
        member(11, "bob", "guest", 2021),
        member(12, "cy", "admin", 2020),
        member(13, "di", "member", 2021),
    ])
}
