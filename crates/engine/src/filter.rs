//! Filter engine — free-text search plus exact-match filters.
//!
//! A record matches when the query text is a case-insensitive substring
//! of at least one searchable field **and** every filter accepts the
//! record's value. Results keep store order.

use dossier_core::{QueryError, Record, Schema, categorical_eq};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// The values a filter accepts: one value, or any of a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accepted {
    One(String),
    AnyOf(Vec<String>),
}

impl Accepted {
    pub fn values(&self) -> &[String] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::AnyOf(vs) => vs,
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.values().iter().any(|v| categorical_eq(v, value))
    }
}

impl From<&str> for Accepted {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<&str>> for Accepted {
    fn from(values: Vec<&str>) -> Self {
        Self::AnyOf(values.into_iter().map(String::from).collect())
    }
}

/// A search request: free text plus optional field filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Matched against searchable fields; empty matches everything.
    #[serde(default)]
    pub text: String,

    /// Field → accepted value(s). Empty means no narrowing.
    #[serde(default)]
    pub filters: BTreeMap<String, Accepted>,
}

impl Query {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: BTreeMap::new(),
        }
    }

    pub fn filter(mut self, field: impl Into<String>, accepted: impl Into<Accepted>) -> Self {
        self.filters.insert(field.into(), accepted.into());
        self
    }

    /// Reject filters on fields the schema does not allow filtering on.
    pub fn validate(&self, schema: &Schema) -> Result<(), QueryError> {
        for (field, accepted) in &self.filters {
            if !schema.has_field(field) {
                return Err(QueryError::UnknownField {
                    collection: schema.collection.clone(),
                    field: field.clone(),
                });
            }
            if !schema.filterable.iter().any(|f| f == field) {
                return Err(QueryError::UnsupportedField {
                    collection: schema.collection.clone(),
                    field: field.clone(),
                    usage: "filtering".into(),
                });
            }
            if accepted.values().is_empty() {
                return Err(QueryError::InvalidArgument(format!(
                    "filter '{field}' must accept at least one value"
                )));
            }
        }
        Ok(())
    }

    /// Filters rendered as `field=value` / `field=a|b`, in field order.
    pub fn describe_filters(&self) -> Vec<String> {
        self.filters
            .iter()
            .map(|(field, accepted)| format!("{field}={}", accepted.values().join("|")))
            .collect()
    }

    /// Whether `record` satisfies this query under `schema`.
    pub fn matches(&self, record: &Record, schema: &Schema) -> bool {
        let filters_ok = self.filters.iter().all(|(field, accepted)| {
            record
                .text(field)
                .is_some_and(|value| accepted.accepts(&value))
        });
        if !filters_ok {
            return false;
        }

        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        schema.searchable.iter().any(|field| {
            record
                .text(field)
                .is_some_and(|value| value.to_lowercase().contains(&needle))
        })
    }
}

/// Run `query` over `records`, returning matches in their original order.
pub fn search(query: &Query, records: &[Record], schema: &Schema) -> Result<Vec<Record>, QueryError> {
    query.validate(schema)?;
    let matches: Vec<Record> = records
        .iter()
        .filter(|record| query.matches(record, schema))
        .cloned()
        .collect();
    debug!(
        collection = %schema.collection,
        text = %query.text,
        filters = query.filters.len(),
        considered = records.len(),
        matched = matches.len(),
        "Search evaluated"
    );
    Ok(matches)
}
