//! Argument parsing and result shaping shared by the domain tools.

use dossier_core::error::{Error, ToolError};
use dossier_core::tool::ToolResult;
use dossier_domains::QueryOutcome;
use dossier_engine::{Accepted, Query};
use serde_json::Value;

/// An optional string argument. `null` counts as absent.
pub(crate) fn optional_str<'a>(arguments: &'a Value, name: &str) -> Result<Option<&'a str>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "'{name}' must be a string, got {other}"
        ))),
    }
}

/// An optional integer argument. `null` counts as absent.
pub(crate) fn optional_int(arguments: &Value, name: &str) -> Result<Option<i64>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            ToolError::InvalidArguments(format!("'{name}' must be an integer, got {v}"))
        }),
    }
}

/// `{ query: string, filters?: { field: value | [values] } }`
pub(crate) fn parse_query(arguments: &Value) -> Result<Query, ToolError> {
    let text = arguments["query"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

    let mut query = Query::text(text);
    match arguments.get("filters") {
        None | Some(Value::Null) => {}
        Some(Value::Object(filters)) => {
            for (field, accepted) in filters {
                query = query.filter(field.as_str(), parse_accepted(field, accepted)?);
            }
        }
        Some(other) => {
            return Err(ToolError::InvalidArguments(format!(
                "'filters' must be an object mapping field to value(s), got {other}"
            )));
        }
    }
    Ok(query)
}

fn parse_accepted(field: &str, value: &Value) -> Result<Accepted, ToolError> {
    let invalid = || {
        ToolError::InvalidArguments(format!(
            "filter '{field}' must be a string or an array of strings, got {value}"
        ))
    };
    match value {
        Value::String(s) => Ok(Accepted::One(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(String::from).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()
            .map(Accepted::AnyOf),
        _ => Err(invalid()),
    }
}

/// Keep the invalid-argument / store-unavailable split visible to callers.
pub(crate) fn to_tool_error(tool_name: &str, error: Error) -> ToolError {
    match error {
        Error::Query(e) => ToolError::InvalidArguments(e.to_string()),
        Error::Store(e) => ToolError::StoreUnavailable {
            tool_name: tool_name.to_string(),
            reason: e.to_string(),
        },
        other => ToolError::ExecutionFailed {
            tool_name: tool_name.to_string(),
            reason: other.to_string(),
        },
    }
}

pub(crate) fn to_tool_result(domain: &str, outcome: QueryOutcome) -> ToolResult {
    ToolResult {
        call_id: String::new(),
        success: true,
        output: outcome.report.text(),
        data: Some(serde_json::json!({
            "kind": outcome.report.kind,
            "domain": domain,
            "matches": outcome.matches,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::error::{QueryError, StoreError};
    use serde_json::json;

    #[test]
    fn query_with_mixed_filters() {
        let query = parse_query(&json!({
            "query": "smith",
            "filters": {"status": ["open", "pending"], "case_type": "litigation"}
        }))
        .unwrap();
        assert_eq!(query.text, "smith");
        assert_eq!(query.describe_filters(), vec!["case_type=litigation", "status=open|pending"]);
    }

    #[test]
    fn missing_query_is_invalid() {
        let err = parse_query(&json!({"filters": {}})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(msg) if msg.contains("'query'")));
    }

    #[test]
    fn non_string_filter_value_is_invalid() {
        assert!(parse_query(&json!({"query": "", "filters": {"status": 3}})).is_err());
        assert!(parse_query(&json!({"query": "", "filters": {"status": ["open", 1]}})).is_err());
        assert!(parse_query(&json!({"query": "", "filters": ["status"]})).is_err());
    }

    #[test]
    fn optional_arguments() {
        let args = json!({"days_ahead": 3, "assigned_to": null, "bad": "7"});
        assert_eq!(optional_int(&args, "days_ahead").unwrap(), Some(3));
        assert_eq!(optional_int(&args, "missing").unwrap(), None);
        assert!(optional_int(&args, "bad").is_err());
        assert_eq!(optional_str(&args, "assigned_to").unwrap(), None);
        assert!(optional_str(&args, "days_ahead").is_err());
    }

    #[test]
    fn error_kinds_stay_distinct() {
        let invalid = to_tool_error("t", Error::Query(QueryError::InvalidArgument("bad".into())));
        let unavailable = to_tool_error(
            "t",
            Error::Store(StoreError::Unavailable {
                store: "file".into(),
                reason: "gone".into(),
            }),
        );
        assert!(matches!(invalid, ToolError::InvalidArguments(_)));
        assert!(matches!(unavailable, ToolError::StoreUnavailable { .. }));
    }
}
