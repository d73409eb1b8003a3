//! Report formatter — fixed, declarative templates per report kind.
//!
//! List reports (search, overdue, upcoming) render a header sentence and
//! one line per record, or a single "none found" sentence echoing the
//! criteria. Summary reports walk a [`SummaryTemplate`]: every declared
//! section and metric renders, with zero values (or a labelled `(none)`
//! row) when the summary has nothing for it.
//!
//! Formatting is a pure function of the payload; it never reads a store.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use dossier_core::{FieldValue, Record};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregate::{Group, Summary, Unit, Value};

/// Discriminator returned alongside the report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    SearchResults,
    OverdueItems,
    UpcomingItems,
    StatsSummary,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SearchResults => write!(f, "search_results"),
            Self::OverdueItems => write!(f, "overdue_items"),
            Self::UpcomingItems => write!(f, "upcoming_items"),
            Self::StatsSummary => write!(f, "stats_summary"),
        }
    }
}

/// A finished report. Write-once; never parsed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub body: Vec<String>,
}

impl Report {
    /// The report as one text block.
    pub fn text(&self) -> String {
        self.body.join("\n")
    }
}

/// Rendering settings shared by all templates.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Currency marker prefixed to money values.
    pub currency: String,
    /// Canonical zone for rendering timestamps.
    pub zone: FixedOffset,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            currency: "$".into(),
            zone: Utc.fix(),
        }
    }
}

// ── List templates ────────────────────────────────────────────────────────

/// One labelled field on a list line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub field: String,
}

impl Column {
    pub fn new(label: &str, field: &str) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
        }
    }
}

/// Line layout for a list report:
/// `- {id}: {headline} | {label}: {value} | ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTemplate {
    pub singular: String,
    pub plural: String,
    /// Field rendered unlabelled right after the id.
    pub headline: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Date column annotated with "N days overdue" / "in N days".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_field: Option<String>,
}

impl ListTemplate {
    pub fn new(singular: &str, plural: &str, headline: &str) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
            headline: headline.into(),
            columns: vec![],
            date_field: None,
        }
    }

    pub fn column(mut self, label: &str, field: &str) -> Self {
        self.columns.push(Column::new(label, field));
        self
    }

    pub fn dated(mut self, field: &str) -> Self {
        self.date_field = Some(field.into());
        self
    }

    fn noun(&self, n: usize) -> &str {
        if n == 1 { &self.singular } else { &self.plural }
    }
}

/// What the caller asked for, echoed back in headers and empty results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criteria {
    Search {
        text: String,
        /// `field=value` descriptions.
        filters: Vec<String>,
    },
    Overdue {
        today: NaiveDate,
        assigned_to: Option<String>,
    },
    Upcoming {
        today: NaiveDate,
        end: NaiveDate,
        days: u32,
    },
}

impl Criteria {
    pub fn kind(&self) -> ReportKind {
        match self {
            Self::Search { .. } => ReportKind::SearchResults,
            Self::Overdue { .. } => ReportKind::OverdueItems,
            Self::Upcoming { .. } => ReportKind::UpcomingItems,
        }
    }
}

// ── Summary templates ─────────────────────────────────────────────────────

/// Where a group-row cell takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "index", rename_all = "snake_case")]
pub enum CellSource {
    /// The group's record count.
    Count,
    /// The n-th metric of the group spec.
    Metric(usize),
}

/// One cell of a group row; `format` holds a single `{}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub source: CellSource,
    pub format: String,
}

impl Cell {
    pub fn count(format: &str) -> Self {
        Self {
            source: CellSource::Count,
            format: format.into(),
        }
    }

    pub fn metric(index: usize, format: &str) -> Self {
        Self {
            source: CellSource::Metric(index),
            format: format.into(),
        }
    }
}

/// A `label: value` line bound to a named summary total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalLine {
    pub label: String,
    pub total: String,
    pub unit: Unit,
}

impl TotalLine {
    pub fn new(label: &str, total: &str, unit: Unit) -> Self {
        Self {
            label: label.into(),
            total: total.into(),
            unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Section {
    /// One row per group of the named table.
    Groups {
        header: String,
        table: String,
        cells: Vec<Cell>,
    },
    /// Fixed lines of named totals.
    Totals {
        header: String,
        lines: Vec<TotalLine>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTemplate {
    pub title: String,
    pub sections: Vec<Section>,
}

impl SummaryTemplate {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.into(),
            sections: vec![],
        }
    }

    pub fn groups(mut self, header: &str, table: &str, cells: Vec<Cell>) -> Self {
        self.sections.push(Section::Groups {
            header: header.into(),
            table: table.into(),
            cells,
        });
        self
    }

    pub fn totals(mut self, header: &str, lines: Vec<TotalLine>) -> Self {
        self.sections.push(Section::Totals {
            header: header.into(),
            lines,
        });
        self
    }

    /// Names of the group tables this template reads.
    pub fn table_names(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter_map(|s| match s {
                Section::Groups { table, .. } => Some(table.as_str()),
                Section::Totals { .. } => None,
            })
            .collect()
    }

    /// Names of the totals this template reads.
    pub fn total_names(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| match s {
                Section::Totals { lines, .. } => lines.iter().map(|l| l.total.as_str()).collect(),
                Section::Groups { .. } => vec![],
            })
            .collect()
    }
}

// ── Formatting ────────────────────────────────────────────────────────────

/// What to render.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    List {
        records: &'a [Record],
        template: &'a ListTemplate,
        criteria: &'a Criteria,
    },
    Summary {
        summary: &'a Summary,
        template: &'a SummaryTemplate,
        today: NaiveDate,
    },
}

/// Render a payload with its kind's fixed template.
pub fn format(payload: Payload<'_>, options: &FormatOptions) -> Report {
    match payload {
        Payload::List {
            records,
            template,
            criteria,
        } => Report {
            kind: criteria.kind(),
            body: format_list(records, template, criteria, options),
        },
        Payload::Summary {
            summary,
            template,
            today,
        } => Report {
            kind: ReportKind::StatsSummary,
            body: format_summary(summary, template, today, options),
        },
    }
}

fn format_list(
    records: &[Record],
    template: &ListTemplate,
    criteria: &Criteria,
    options: &FormatOptions,
) -> Vec<String> {
    if records.is_empty() {
        return vec![empty_sentence(template, criteria)];
    }

    let n = records.len();
    let noun = template.noun(n);
    let header = match criteria {
        Criteria::Search { text, filters } => {
            let mut header = format!("Found {n} {noun}");
            if !text.is_empty() {
                header.push_str(&format!(" matching \"{text}\""));
            }
            if !filters.is_empty() {
                header.push_str(&format!(" with filters {}", filters.join(", ")));
            }
            header
        }
        Criteria::Overdue { today, assigned_to } => {
            let mut header = format!("Found {n} overdue {noun} as of {today}");
            if let Some(who) = assigned_to {
                header.push_str(&format!(" assigned to {who}"));
            }
            header
        }
        Criteria::Upcoming { today, end, days } => {
            format!(
                "Found {n} {noun} in the next {} ({today} to {end})",
                plural(u64::from(*days), "day", "days")
            )
        }
    };

    let mut body = Vec::with_capacity(n + 1);
    body.push(format!("{header}:"));
    body.extend(
        records
            .iter()
            .map(|record| format_line(record, template, criteria, options)),
    );
    body
}

fn empty_sentence(template: &ListTemplate, criteria: &Criteria) -> String {
    let plural_noun = &template.plural;
    match criteria {
        Criteria::Search { text, filters } => {
            let mut sentence = format!("No {plural_noun} found");
            if !text.is_empty() {
                sentence.push_str(&format!(" matching \"{text}\""));
            }
            if !filters.is_empty() {
                sentence.push_str(&format!(" with filters {}", filters.join(", ")));
            }
            sentence.push('.');
            sentence
        }
        Criteria::Overdue { today, assigned_to } => {
            let mut sentence = format!("No overdue {plural_noun} as of {today}");
            if let Some(who) = assigned_to {
                sentence.push_str(&format!(" assigned to {who}"));
            }
            sentence.push('.');
            sentence
        }
        Criteria::Upcoming { today, end, days } => format!(
            "No {plural_noun} in the next {} ({today} to {end}).",
            plural(u64::from(*days), "day", "days")
        ),
    }
}

fn format_line(
    record: &Record,
    template: &ListTemplate,
    criteria: &Criteria,
    options: &FormatOptions,
) -> String {
    let mut line = format!("- {}", record.id());
    if let Some(headline) = record.get(&template.headline) {
        line.push_str(&format!(": {}", render_field(headline, options)));
    }

    for column in &template.columns {
        let value = match record.get(&column.field) {
            Some(value) => {
                let mut rendered = render_field(value, options);
                if template.date_field.as_deref() == Some(column.field.as_str()) {
                    if let Some(note) = relative_note(value, criteria, options) {
                        rendered.push_str(&format!(" ({note})"));
                    }
                }
                rendered
            }
            None => crate::aggregate::UNSPECIFIED.to_string(),
        };
        line.push_str(&format!(" | {}: {value}", column.label));
    }
    line
}

fn relative_note(value: &FieldValue, criteria: &Criteria, options: &FormatOptions) -> Option<String> {
    let date = value.day_in(&options.zone)?;
    match criteria {
        Criteria::Overdue { today, .. } => {
            let days = (*today - date).num_days();
            (days > 0).then(|| format!("{} overdue", plural(days as u64, "day", "days")))
        }
        Criteria::Upcoming { today, .. } => {
            let days = (date - *today).num_days();
            match days {
                0 => Some("today".into()),
                1 => Some("tomorrow".into()),
                d if d > 1 => Some(format!("in {d} days")),
                _ => None,
            }
        }
        Criteria::Search { .. } => None,
    }
}

fn format_summary(
    summary: &Summary,
    template: &SummaryTemplate,
    today: NaiveDate,
    options: &FormatOptions,
) -> Vec<String> {
    let mut body = vec![format!("{} (as of {today})", template.title)];

    for section in &template.sections {
        body.push(String::new());
        match section {
            Section::Groups {
                header,
                table,
                cells,
            } => {
                body.push(format!("{header}:"));
                let groups = summary.table(table).map(|t| t.groups.as_slice()).unwrap_or(&[]);
                if groups.is_empty() {
                    body.push("  (none)".into());
                }
                for group in groups {
                    body.push(format!("  {}: {}", group.key, format_cells(group, cells, options)));
                }
            }
            Section::Totals { header, lines } => {
                body.push(format!("{header}:"));
                for line in lines {
                    let value = summary
                        .total(&line.total)
                        .cloned()
                        .unwrap_or_else(|| Value::zero(line.unit));
                    body.push(format!("  {}: {}", line.label, format_value(&value, options)));
                }
            }
        }
    }
    body
}

fn format_cells(group: &Group, cells: &[Cell], options: &FormatOptions) -> String {
    cells
        .iter()
        .map(|cell| {
            let value = match cell.source {
                CellSource::Count => Value::Count(group.count),
                CellSource::Metric(i) => group
                    .values
                    .get(i)
                    .cloned()
                    .unwrap_or(Value::Count(0)),
            };
            cell.format.replacen("{}", &format_value(&value, options), 1)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render an aggregate value in its unit.
pub fn format_value(value: &Value, options: &FormatOptions) -> String {
    match value {
        Value::Count(n) => n.to_string(),
        Value::Money(amount) => format_money(*amount, &options.currency),
        Value::Number(n) => n.normalize().to_string(),
        Value::Rate(rate) => format!("{}% ({} of {})", rate.percent, rate.matching, rate.total),
    }
}

/// Money with exactly two decimal places and a currency marker.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{currency}{}", rounded.abs())
    } else {
        format!("{currency}{}", rounded.abs())
    }
}

fn render_field(value: &FieldValue, options: &FormatOptions) -> String {
    match value {
        FieldValue::Money(amount) => format_money(*amount, &options.currency),
        FieldValue::Timestamp(ts) => ts
            .with_timezone(&options.zone)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        other => other.to_string(),
    }
}

fn plural(n: u64, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}
