//! Records and the schemas that validate them.
//!
//! A record is a flat key-value map. Which keys exist, what they hold and
//! which of them are searchable, filterable or carry a status is described
//! by a [`Schema`], one per collection. There is no type per domain: the
//! legal, billing and veterinary datasets are all plain `Record`s checked
//! against different schemas.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Name of the identifier field every record carries.
pub const ID_FIELD: &str = "id";

/// The declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    /// Exact decimal quantity without a currency.
    Number,
    /// Exact decimal amount of money.
    Money,
    /// Calendar day (`YYYY-MM-DD`).
    Date,
    /// Instant in time, stored in UTC.
    Timestamp,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Money => write!(f, "money"),
            Self::Date => write!(f, "date"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(Decimal),
    Money(Decimal),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Numeric value for summation, if this is a numeric field.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Number(d) | Self::Money(d) => Some(*d),
            _ => None,
        }
    }

    /// The calendar day this value falls on in `zone`.
    ///
    /// Dates are zone-free and returned as-is; timestamps are converted.
    pub fn day_in(&self, zone: &FixedOffset) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Timestamp(ts) => Some(ts.with_timezone(zone).date_naive()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(d) | Self::Money(d) => write!(f, "{d}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(i) => serializer.serialize_i64(*i),
            // Decimals and dates travel as strings so they re-validate exactly.
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Case-insensitive comparison of categorical values (statuses, plans, names).
pub fn categorical_eq(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// A single record: a flat map of field name to typed value.
///
/// Records produced by [`Schema::validate`] always carry a text `id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(ID_FIELD.to_string(), FieldValue::Text(id.into()));
        Self { fields }
    }

    /// Builder-style setter.
    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn id(&self) -> &str {
        match self.fields.get(ID_FIELD) {
            Some(FieldValue::Text(id)) => id,
            _ => "",
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// The rendered value of a field, if present.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).map(ToString::to_string)
    }
}

/// Declaration of one field in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

/// Field descriptor for one collection.
///
/// The filter engine, window evaluator and aggregator take this as
/// configuration: which fields text search looks at, which fields accept
/// exact-match filters, and which status values are terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Collection name (plural, e.g. `"tasks"`).
    pub collection: String,

    pub fields: Vec<FieldSpec>,

    /// Fields matched by free-text search.
    #[serde(default)]
    pub searchable: Vec<String>,

    /// Fields accepted as exact/set-membership filters.
    #[serde(default)]
    pub filterable: Vec<String>,

    /// Field holding the lifecycle status, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_field: Option<String>,

    /// Statuses that exempt a record from overdue classification.
    #[serde(default)]
    pub terminal_statuses: Vec<String>,
}

impl Schema {
    /// Create a schema containing only the required `id` field.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: vec![FieldSpec {
                name: ID_FIELD.into(),
                kind: FieldKind::Text,
                required: true,
            }],
            searchable: vec![],
            filterable: vec![],
            status_field: None,
            terminal_statuses: vec![],
        }
    }

    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    pub fn required(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn searchable(mut self, fields: &[&str]) -> Self {
        self.searchable = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn filterable(mut self, fields: &[&str]) -> Self {
        self.filterable = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn status(mut self, field: &str, terminal: &[&str]) -> Self {
        self.status_field = Some(field.into());
        self.terminal_statuses = terminal.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.spec(name).is_some()
    }

    /// Whether `status` is one of this collection's terminal statuses.
    pub fn is_terminal(&self, status: &str) -> bool {
        self.terminal_statuses
            .iter()
            .any(|t| categorical_eq(t, status))
    }

    /// Check that every referenced field is declared.
    pub fn check(&self) -> Result<(), SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidSchema {
            collection: self.collection.clone(),
            reason,
        };

        match self.spec(ID_FIELD) {
            Some(spec) if spec.kind == FieldKind::Text => {}
            _ => return Err(invalid("missing text 'id' field".into())),
        }

        for name in self.searchable.iter().chain(&self.filterable) {
            if !self.has_field(name) {
                return Err(invalid(format!("undeclared field '{name}'")));
            }
        }

        if let Some(status) = &self.status_field {
            if !self.has_field(status) {
                return Err(invalid(format!("undeclared status field '{status}'")));
            }
        }

        Ok(())
    }

    /// Validate a raw JSON object into a typed [`Record`].
    ///
    /// `null` and blank strings count as missing. Unknown keys are ignored.
    pub fn validate(&self, raw: &serde_json::Value) -> Result<Record, SchemaError> {
        let object = raw.as_object().ok_or_else(|| SchemaError::NotAnObject {
            collection: self.collection.clone(),
        })?;

        let mut fields = BTreeMap::new();
        for spec in &self.fields {
            let value = match object.get(&spec.name) {
                Some(v) => self.coerce(spec, v)?,
                None => None,
            };
            match value {
                Some(v) => {
                    fields.insert(spec.name.clone(), v);
                }
                None if spec.required => {
                    return Err(SchemaError::MissingField {
                        collection: self.collection.clone(),
                        field: spec.name.clone(),
                    });
                }
                None => {}
            }
        }

        for key in object.keys() {
            if !self.has_field(key) {
                tracing::warn!(collection = %self.collection, field = %key, "Ignoring undeclared field");
            }
        }

        Ok(Record { fields })
    }

    /// Validate a batch of raw records, preserving order.
    pub fn validate_all(&self, raws: &[serde_json::Value]) -> Result<Vec<Record>, SchemaError> {
        raws.iter().map(|raw| self.validate(raw)).collect()
    }

    fn coerce(
        &self,
        spec: &FieldSpec,
        raw: &serde_json::Value,
    ) -> Result<Option<FieldValue>, SchemaError> {
        use serde_json::Value;

        let text = match raw {
            Value::Null => return Ok(None),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => {
                let text = n.to_string();
                let decimal = matches!(spec.kind, FieldKind::Number | FieldKind::Money);
                if decimal && n.is_f64() && significant_digits(&text) > F64_EXACT_DIGITS {
                    return Err(self.mismatch(
                        spec,
                        &format!("{text} (beyond float precision, quote the amount as a string)"),
                    ));
                }
                text
            }
            Value::Bool(b) if spec.kind == FieldKind::Text => b.to_string(),
            other => return Err(self.mismatch(spec, json_type(other))),
        };

        let value = match spec.kind {
            FieldKind::Text => FieldValue::Text(text),
            FieldKind::Integer => text
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| self.mismatch(spec, &text))?,
            FieldKind::Number => FieldValue::Number(
                parse_decimal(&text).ok_or_else(|| self.mismatch(spec, &text))?,
            ),
            FieldKind::Money => FieldValue::Money(
                parse_decimal(&text).ok_or_else(|| self.mismatch(spec, &text))?,
            ),
            FieldKind::Date => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| self.mismatch(spec, &text))?,
            FieldKind::Timestamp => FieldValue::Timestamp(
                parse_timestamp(&text).ok_or_else(|| self.mismatch(spec, &text))?,
            ),
        };

        Ok(Some(value))
    }

    fn mismatch(&self, spec: &FieldSpec, found: &str) -> SchemaError {
        SchemaError::InvalidValue {
            collection: self.collection.clone(),
            field: spec.name.clone(),
            expected: spec.kind.to_string(),
            found: found.to_string(),
        }
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Decimal digits an `f64` carries without loss.
const F64_EXACT_DIGITS: usize = 15;

/// Significant digits of a rendered number (`"0.0120"` → 2, `"1.5e20"` → 2).
fn significant_digits(text: &str) -> usize {
    let mantissa = text.split(['e', 'E']).next().unwrap_or_default();
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}

/// Parse a decimal from its textual form.
///
/// JSON floats reach this already rounded to `f64`; [`Schema::validate`]
/// rejects those with more digits than an `f64` keeps, so amounts that need
/// them must arrive as strings.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Parse an RFC 3339 timestamp, or a zone-less one interpreted as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}
