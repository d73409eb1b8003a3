//! Declarative record predicates.
//!
//! Used wherever a stats template needs "the subset of records where ...":
//! group pre-filters, rate numerators and scalar reductions. Predicates are
//! plain data (serde-friendly) so domain catalogs can declare them.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use dossier_core::{Record, Schema, categorical_eq};
use serde::{Deserialize, Serialize};

use crate::window::{WindowEvaluator, today};

/// Everything a predicate may consult besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub schema: &'a Schema,
    pub today: NaiveDate,
    pub zone: FixedOffset,
}

impl<'a> EvalContext<'a> {
    pub fn new(schema: &'a Schema, reference_instant: DateTime<Utc>, zone: FixedOffset) -> Self {
        Self {
            schema,
            today: today(reference_instant, &zone),
            zone,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    #[default]
    Always,
    Equals {
        field: String,
        value: String,
    },
    OneOf {
        field: String,
        values: Vec<String>,
    },
    Missing {
        field: String,
    },
    Not {
        predicate: Box<Predicate>,
    },
    All {
        of: Vec<Predicate>,
    },
    Any {
        of: Vec<Predicate>,
    },
    /// Date strictly before today and status not terminal.
    Overdue {
        field: String,
    },
    /// Date within `[today, today + days]`.
    DueWithin {
        field: String,
        days: u32,
    },
    /// Date in the same calendar month as today.
    SameMonth {
        field: String,
    },
}

impl Predicate {
    pub fn equals(field: &str, value: &str) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn one_of(field: &str, values: &[&str]) -> Self {
        Self::OneOf {
            field: field.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    pub fn negate(predicate: Predicate) -> Self {
        Self::Not {
            predicate: Box::new(predicate),
        }
    }

    pub fn all(of: Vec<Predicate>) -> Self {
        Self::All { of }
    }

    pub fn overdue(field: &str) -> Self {
        Self::Overdue {
            field: field.into(),
        }
    }

    pub fn due_within(field: &str, days: u32) -> Self {
        Self::DueWithin {
            field: field.into(),
            days,
        }
    }

    pub fn same_month(field: &str) -> Self {
        Self::SameMonth {
            field: field.into(),
        }
    }

    pub fn evaluate(&self, record: &Record, ctx: &EvalContext<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::Equals { field, value } => record
                .text(field)
                .is_some_and(|v| categorical_eq(&v, value)),
            Self::OneOf { field, values } => record
                .text(field)
                .is_some_and(|v| values.iter().any(|accepted| categorical_eq(&v, accepted))),
            Self::Missing { field } => record.get(field).is_none(),
            Self::Not { predicate } => !predicate.evaluate(record, ctx),
            Self::All { of } => of.iter().all(|p| p.evaluate(record, ctx)),
            Self::Any { of } => of.iter().any(|p| p.evaluate(record, ctx)),
            Self::Overdue { field } => WindowEvaluator::new(ctx.schema, field, ctx.zone)
                .is_ok_and(|w| w.is_overdue(record, ctx.today)),
            Self::DueWithin { field, days } => WindowEvaluator::new(ctx.schema, field, ctx.zone)
                .is_ok_and(|w| w.is_upcoming(record, ctx.today, *days)),
            Self::SameMonth { field } => record
                .get(field)
                .and_then(|v| v.day_in(&ctx.zone))
                .is_some_and(|d| d.year() == ctx.today.year() && d.month() == ctx.today.month()),
        }
    }

    /// Every field name this predicate reads.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Always => vec![],
            Self::Equals { field, .. }
            | Self::OneOf { field, .. }
            | Self::Missing { field }
            | Self::Overdue { field }
            | Self::DueWithin { field, .. }
            | Self::SameMonth { field } => vec![field.as_str()],
            Self::Not { predicate } => predicate.fields(),
            Self::All { of } | Self::Any { of } => of.iter().flat_map(|p| p.fields()).collect(),
        }
    }
}
