//! hashrel - lazily-evaluated in-memory query relations.
//!
//! A [`Relation`] is a query scope over the records of a [`RecordType`].
//! Filters are recorded, not applied, until the results are read; ordering
//! and projection work on the materialized records.
//!
//! # Example
//!
//! ```rust
//! use hashrel::{Collection, FieldValue, Query, RecordType};
//! use serde_json::json;
//!
//! let people = Collection::from_json(
//!     "Person",
//!     "id",
//!     json!([
//!         {"id": 1, "name": "A", "age": 30},
//!         {"id": 2, "name": "B", "age": 25},
//!         {"id": 3, "name": "A", "age": 20}
//!     ]),
//! )
//! .unwrap();
//!
//! let named_a = people.all().filter(Query::new().eq("name", "A"));
//! assert_eq!(named_a.pluck(&["id"]), vec![FieldValue::Int(1), FieldValue::Int(3)]);
//!
//! let ordered = people.all().order("name, age DESC").unwrap();
//! assert_eq!(ordered.len(), 3);
//! ```

pub mod config;
pub mod error;
pub mod query;
pub mod record;
pub mod relation;
pub mod value;

pub use config::Config;
pub use error::{RelationError, RelationResult};
pub use query::{
    matches, normalize, Clause, Condition, Direction, FieldRange, OrderSpec, OrderTerm, Query,
};
pub use record::{index_key, Collection, Document, Record, RecordType};
pub use relation::{Iter, Relation};
pub use value::FieldValue;
