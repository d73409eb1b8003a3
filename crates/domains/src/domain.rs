//! Domain descriptor — everything the service needs to answer the four
//! query shapes for one business domain.
//!
//! A domain is data, not code: schemas, which collection each query shape
//! reads, the list and summary templates, and the stats bindings. The
//! three built-in domains are constructed in their own modules.

use chrono::{Duration, FixedOffset, NaiveDate, Offset, Utc};
use dossier_core::{Error, QueryError, Record, Schema, SchemaError};
use dossier_engine::{GroupSpec, ListTemplate, Predicate, ScalarSpec, SummaryTemplate, WindowEvaluator};

/// Name and description of the tool exposing one query shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

impl ToolInfo {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchBinding {
    pub collection: String,
    pub template: ListTemplate,
    pub tool: ToolInfo,
}

/// A date-window query shape (overdue or upcoming).
#[derive(Debug, Clone)]
pub struct WindowBinding {
    pub collection: String,
    pub date_field: String,
    /// Field matched by the optional `assigned_to` argument.
    pub assignee_field: Option<String>,
    pub template: ListTemplate,
    pub tool: ToolInfo,
}

/// A group table of the stats summary.
#[derive(Debug, Clone)]
pub struct TableBinding {
    pub collection: String,
    /// Records outside this predicate are not grouped.
    pub filter: Predicate,
    pub spec: GroupSpec,
}

/// A scalar total of the stats summary.
#[derive(Debug, Clone)]
pub struct TotalBinding {
    pub collection: String,
    pub spec: ScalarSpec,
}

#[derive(Debug, Clone)]
pub struct StatsBinding {
    pub template: SummaryTemplate,
    pub tables: Vec<TableBinding>,
    pub totals: Vec<TotalBinding>,
    pub tool: ToolInfo,
}

impl StatsBinding {
    /// Every collection a stats call reads, first-use order.
    pub fn collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let used = self
            .tables
            .iter()
            .map(|t| t.collection.as_str())
            .chain(self.totals.iter().map(|t| t.collection.as_str()));
        for name in used {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Raw sample rows per collection, generated around a reference day.
pub type SampleFn = fn(NaiveDate) -> Vec<(&'static str, Vec<serde_json::Value>)>;

#[derive(Debug, Clone)]
pub struct Domain {
    pub name: String,
    pub title: String,
    pub schemas: Vec<Schema>,
    pub search: SearchBinding,
    pub overdue: WindowBinding,
    pub upcoming: WindowBinding,
    pub stats: StatsBinding,
    pub(crate) sample: SampleFn,
}

impl Domain {
    pub fn schema(&self, collection: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.collection == collection)
    }

    fn require_schema(&self, collection: &str) -> Result<&Schema, SchemaError> {
        self.schema(collection).ok_or_else(|| SchemaError::InvalidSchema {
            collection: collection.to_string(),
            reason: format!("collection is not declared by domain '{}'", self.name),
        })
    }

    pub fn collections(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.collection.as_str()).collect()
    }

    /// Tools in query-shape order: search, overdue, upcoming, stats.
    pub fn tools(&self) -> [&ToolInfo; 4] {
        [
            &self.search.tool,
            &self.overdue.tool,
            &self.upcoming.tool,
            &self.stats.tool,
        ]
    }

    /// Validated sample records, with dates laid out around `today`.
    pub fn sample_records(&self, today: NaiveDate) -> Result<Vec<(String, Vec<Record>)>, SchemaError> {
        let span = Duration::days(SAMPLE_SPAN_DAYS);
        if today.checked_sub_signed(span).is_none() || today.checked_add_signed(span).is_none() {
            return Err(SchemaError::AnchorOutOfRange {
                domain: self.name.clone(),
                anchor: today,
            });
        }
        (self.sample)(today)
            .into_iter()
            .map(|(collection, raws)| {
                let schema = self.require_schema(collection)?;
                Ok((collection.to_string(), schema.validate_all(&raws)?))
            })
            .collect()
    }

    /// Replace the terminal statuses of one collection.
    pub fn set_terminal_statuses(&mut self, collection: &str, statuses: &[String]) -> Result<(), SchemaError> {
        let domain = self.name.clone();
        let schema = self
            .schemas
            .iter_mut()
            .find(|s| s.collection == collection)
            .ok_or_else(|| SchemaError::InvalidSchema {
                collection: collection.to_string(),
                reason: format!("collection is not declared by domain '{domain}'"),
            })?;
        if schema.status_field.is_none() {
            return Err(SchemaError::InvalidSchema {
                collection: collection.to_string(),
                reason: "collection has no status field".into(),
            });
        }
        schema.terminal_statuses = statuses.to_vec();
        Ok(())
    }

    /// Check that every binding refers to declared collections and fields
    /// of the right kind, and that the summary template only reads tables
    /// and totals the stats binding produces.
    pub fn validate(&self) -> Result<(), Error> {
        for schema in &self.schemas {
            schema.check()?;
        }

        let schema = self.require_schema(&self.search.collection)?;
        check_template(schema, &self.search.template)?;

        let utc: FixedOffset = Utc.fix();
        for binding in [&self.overdue, &self.upcoming] {
            let schema = self.require_schema(&binding.collection)?;
            WindowEvaluator::new(schema, &binding.date_field, utc)?;
            if let Some(field) = &binding.assignee_field {
                require_field(schema, field)?;
            }
            check_template(schema, &binding.template)?;
        }

        for table in &self.stats.tables {
            let schema = self.require_schema(&table.collection)?;
            table.spec.validate(schema)?;
            for field in table.filter.fields() {
                require_field(schema, field)?;
            }
        }
        for total in &self.stats.totals {
            let schema = self.require_schema(&total.collection)?;
            total.spec.validate(schema)?;
        }

        for name in self.stats.template.table_names() {
            if !self.stats.tables.iter().any(|t| t.spec.name == name) {
                return Err(Error::Internal(format!(
                    "{}: summary template reads unknown table '{name}'",
                    self.name
                )));
            }
        }
        for name in self.stats.template.total_names() {
            if !self.stats.totals.iter().any(|t| t.spec.name == name) {
                return Err(Error::Internal(format!(
                    "{}: summary template reads unknown total '{name}'",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

fn require_field(schema: &Schema, field: &str) -> Result<(), QueryError> {
    if schema.has_field(field) {
        Ok(())
    } else {
        Err(QueryError::UnknownField {
            collection: schema.collection.clone(),
            field: field.to_string(),
        })
    }
}

fn check_template(schema: &Schema, template: &ListTemplate) -> Result<(), QueryError> {
    require_field(schema, &template.headline)?;
    for column in &template.columns {
        require_field(schema, &column.field)?;
    }
    if let Some(field) = &template.date_field {
        require_field(schema, field)?;
    }
    Ok(())
}

/// Furthest any sample date lies from the anchor day.
const SAMPLE_SPAN_DAYS: i64 = 400;

/// `today + offset` as `YYYY-MM-DD`, for sample data. Empty (missing) when
/// out of range; [`Domain::sample_records`] rejects such anchors first.
pub(crate) fn day(today: NaiveDate, offset: i64) -> String {
    today
        .checked_add_signed(Duration::days(offset))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// `today + offset` at a UTC wall time, for sample data.
pub(crate) fn at(today: NaiveDate, offset: i64, time: &str) -> String {
    format!("{}T{time}:00Z", day(today, offset))
}
