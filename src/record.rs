//! Records and the record types that own them.
//!
//! A [`RecordType`] owns an ordered set of records plus an identifier index.
//! Relations borrow both and never copy records.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::error::{RelationError, RelationResult};
use crate::relation::Relation;
use crate::value::FieldValue;

/// Field access on a single record.
pub trait Record {
    /// Value of the named field, `FieldValue::Null` when absent.
    fn get(&self, field: &str) -> FieldValue;
}

/// Owner of a fixed, ordered record set.
pub trait RecordType {
    type Record: Record;

    /// Human-readable name used in error messages.
    fn type_name(&self) -> &str;

    /// All loaded records, in load order.
    fn records(&self) -> &[Self::Record];

    /// Identifier key (see [`index_key`]) to position in
    /// [`RecordType::records`].
    fn record_index(&self) -> &HashMap<String, usize>;

    /// Name of the identifier field.
    fn id_field(&self) -> &str {
        "id"
    }

    /// Direct lookup through the identifier index.
    fn find_using_index(&self, id: &FieldValue) -> Option<&Self::Record> {
        let position = *self.record_index().get(&index_key(id))?;
        self.records().get(position)
    }

    /// Unscoped relation over every record.
    fn all(&self) -> Relation<'_, Self>
    where
        Self: Sized,
    {
        Relation::new(self)
    }
}

/// Index key for an identifier value.
///
/// Identifiers are keyed by their integer coercion, the same normalization
/// queries apply to the identifier field, so `7`, `"7"`, `"07"` and `7.0`
/// share one key.
pub fn index_key(id: &FieldValue) -> String {
    id.to_integer().to_string()
}

/// A record backed by a JSON object.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct Document {
    data: Value,
}

impl Document {
    /// Wrap a JSON object. Anything else is rejected.
    pub fn new(data: Value) -> RelationResult<Self> {
        if !data.is_object() {
            return Err(RelationError::InvalidRecord(format!(
                "expected a JSON object, got {}",
                data
            )));
        }
        Ok(Self { data })
    }

    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl Record for Document {
    /// Supports dotted paths such as `address.city`.
    fn get(&self, field: &str) -> FieldValue {
        let mut current = &self.data;
        for part in field.split('.') {
            match current.get(part) {
                Some(val) => current = val,
                None => return FieldValue::Null,
            }
        }
        FieldValue::from(current)
    }
}

/// In-memory record type holding JSON documents.
#[derive(Debug, Clone)]
pub struct Collection {
    name: String,
    id_field: String,
    documents: Vec<Document>,
    index: HashMap<String, usize>,
}

impl Collection {
    /// Create a collection keyed on the `id` field.
    pub fn new(name: &str, documents: Vec<Document>) -> RelationResult<Self> {
        Self::with_id_field(name, "id", documents)
    }

    /// Create a collection keyed on a custom identifier field.
    ///
    /// Identifiers must stay distinct after integer coercion. Text codes
    /// such as `"CA"` all coerce to 0 and are rejected, as is a record
    /// missing the field alongside one whose identifier is 0.
    pub fn with_id_field(
        name: &str,
        id_field: &str,
        documents: Vec<Document>,
    ) -> RelationResult<Self> {
        let mut index = HashMap::with_capacity(documents.len());
        for (position, doc) in documents.iter().enumerate() {
            let id = doc.get(id_field);
            if let Some(previous) = index.insert(index_key(&id), position) {
                return Err(RelationError::InvalidRecord(format!(
                    "{} records {} and {} share {} {} (as integer {})",
                    name,
                    previous,
                    position,
                    id_field,
                    documents[previous].get(id_field).to_json(),
                    id.to_integer()
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            id_field: id_field.to_string(),
            documents,
            index,
        })
    }

    /// Build a collection from a JSON array of objects.
    pub fn from_json(name: &str, id_field: &str, value: Value) -> RelationResult<Self> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(RelationError::InvalidRecord(format!(
                    "expected a JSON array of records, got {}",
                    other
                )))
            }
        };

        let documents = items
            .into_iter()
            .map(Document::new)
            .collect::<RelationResult<Vec<_>>>()?;

        Self::with_id_field(name, id_field, documents)
    }

    /// Load a collection from a JSON file containing an array of objects.
    pub fn load(name: &str, id_field: &str, path: &Path) -> RelationResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        let collection = Self::from_json(name, id_field, value)?;
        tracing::debug!(
            "Loaded {} records into {} from {}",
            collection.documents.len(),
            name,
            path.display()
        );
        Ok(collection)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl RecordType for Collection {
    type Record = Document;

    fn type_name(&self) -> &str {
        &self.name
    }

    fn records(&self) -> &[Document] {
        &self.documents
    }

    fn record_index(&self) -> &HashMap<String, usize> {
        &self.index
    }

    fn id_field(&self) -> &str {
        &self.id_field
    }
}
