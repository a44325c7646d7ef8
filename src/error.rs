//! Error types for hashrel.

use thiserror::Error;

/// Relation error type
#[derive(Error, Debug)]
pub enum RelationError {
    #[error("{0}")]
    RecordNotFound(String),

    #[error("{0}")]
    ArgumentError(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for relation operations
pub type RelationResult<T> = Result<T, RelationError>;

impl RelationError {
    pub fn not_found(type_name: &str) -> Self {
        RelationError::RecordNotFound(format!("Couldn't find {}", type_name))
    }

    pub fn not_found_with_id(type_name: &str, id: impl std::fmt::Display) -> Self {
        RelationError::RecordNotFound(format!("Couldn't find {} with ID={}", type_name, id))
    }

    pub fn not_found_without_id(type_name: &str) -> Self {
        RelationError::RecordNotFound(format!("Couldn't find {} without an ID", type_name))
    }

    /// Raised when a method that needs at least one argument got none.
    pub fn missing_arguments(method: &str) -> Self {
        RelationError::ArgumentError(format!(
            "The method .{}() must contain arguments.",
            method
        ))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RelationError::RecordNotFound(_))
    }
}

impl serde::Serialize for RelationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RelationError::not_found("Country");
        assert_eq!(err.to_string(), "Couldn't find Country");

        let err = RelationError::not_found_with_id("Country", 99);
        assert_eq!(err.to_string(), "Couldn't find Country with ID=99");

        let err = RelationError::not_found_without_id("Country");
        assert_eq!(err.to_string(), "Couldn't find Country without an ID");

        let err = RelationError::missing_arguments("order");
        assert_eq!(
            err.to_string(),
            "The method .order() must contain arguments."
        );

        let err = RelationError::InvalidRecord("expected object".to_string());
        assert_eq!(err.to_string(), "Invalid record: expected object");
    }

    #[test]
    fn test_is_not_found() {
        assert!(RelationError::not_found("Country").is_not_found());
        assert!(!RelationError::missing_arguments("order").is_not_found());
    }

    #[test]
    fn test_serialize_as_message() {
        let err = RelationError::not_found_with_id("Country", "abc");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!("Couldn't find Country with ID=abc"));
    }
}
