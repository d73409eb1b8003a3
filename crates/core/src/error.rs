//! Error types for the Dossier domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use chrono::NaiveDate;
use thiserror::Error;

/// The top-level error type for all Dossier operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Record store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Query / argument errors ---
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    // --- Record validation errors ---
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the record store collaborator.
///
/// These are never rendered as "no results": an unavailable store is a
/// different outcome from an empty one.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Record store '{store}' is unavailable: {reason}")]
    Unavailable { store: String, reason: String },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Corrupt record in '{collection}' at line {line}: {reason}")]
    Corrupt {
        collection: String,
        line: usize,
        reason: String,
    },
}

/// Caller-supplied arguments the engine refuses to interpret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Unknown field '{field}' for {collection}")]
    UnknownField { collection: String, field: String },

    #[error("Field '{field}' cannot be used for {usage} on {collection}")]
    UnsupportedField {
        collection: String,
        field: String,
        usage: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{collection}: record is not a JSON object")]
    NotAnObject { collection: String },

    #[error("{collection}: missing required field '{field}'")]
    MissingField { collection: String, field: String },

    #[error("{collection}: field '{field}' expected {expected}, got {found}")]
    InvalidValue {
        collection: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("Invalid schema '{collection}': {reason}")]
    InvalidSchema { collection: String, reason: String },

    #[error("{domain}: sample data cannot be dated around {anchor}")]
    AnchorOutOfRange { domain: String, anchor: NaiveDate },
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Record store unavailable for {tool_name}: {reason}")]
    StoreUnavailable { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_displays_correctly() {
        let err = Error::Store(StoreError::Unavailable {
            store: "file".into(),
            reason: "data directory missing".into(),
        });
        assert!(err.to_string().contains("file"));
        assert!(err.to_string().contains("data directory missing"));
    }

    #[test]
    fn query_error_converts_into_top_level() {
        let err: Error = QueryError::InvalidArgument("days_ahead must be >= 0".into()).into();
        assert!(matches!(err, Error::Query(_)));
        assert!(err.to_string().contains("days_ahead"));
    }

    #[test]
    fn top_level_variants_come_from_bounded_contexts() {
        let errors: Vec<Error> = vec![
            StoreError::UnknownCollection("cases".into()).into(),
            QueryError::InvalidArgument("bad".into()).into(),
            SchemaError::NotAnObject {
                collection: "cases".into(),
            }
            .into(),
            ToolError::NotFound("search_cases".into()).into(),
            Error::Internal("unbound table".into()),
        ];
        let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "Store error: Unknown collection: cases",
                "Invalid query: bad",
                "Schema error: cases: record is not a JSON object",
                "Tool error: Tool not found: search_cases",
                "Internal error: unbound table",
            ]
        );
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::StoreUnavailable {
            tool_name: "search_cases".into(),
            reason: "connection refused".into(),
        });
        assert!(err.to_string().contains("search_cases"));
        assert!(err.to_string().contains("connection refused"));
    }
}
