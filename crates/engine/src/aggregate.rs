//! Aggregator — grouped counts, sums and rates, plus scalar totals.
//!
//! Invariants:
//! - every record considered lands in exactly one group; records missing a
//!   grouped field go under [`UNSPECIFIED`];
//! - groups appear in first-occurrence order;
//! - sums use exact decimal arithmetic.

use dossier_core::{FieldKind, QueryError, Record, Schema};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::predicate::{EvalContext, Predicate};

/// Group key used for records that lack a grouped field.
pub const UNSPECIFIED: &str = "unspecified";

/// Decimal places of a rendered rate percentage.
const RATE_DECIMALS: u32 = 1;

/// The unit a value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Count,
    Money,
    Number,
    Percent,
}

/// A rate: `matching / total`, with its percentage fixed at one decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rate {
    pub matching: u64,
    pub total: u64,
    pub percent: Decimal,
}

impl Rate {
    pub fn new(matching: u64, total: u64) -> Self {
        let mut percent = if total == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(matching) * Decimal::from(100u32) / Decimal::from(total))
                .round_dp_with_strategy(RATE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        };
        percent.rescale(RATE_DECIMALS);
        Self {
            matching,
            total,
            percent,
        }
    }
}

/// An aggregate value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum Value {
    Count(u64),
    Money(Decimal),
    Number(Decimal),
    Rate(Rate),
}

impl Value {
    pub fn zero(unit: Unit) -> Self {
        match unit {
            Unit::Count => Self::Count(0),
            Unit::Money => Self::Money(Decimal::ZERO),
            Unit::Number => Self::Number(Decimal::ZERO),
            Unit::Percent => Self::Rate(Rate::new(0, 0)),
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            Self::Count(_) => Unit::Count,
            Self::Money(_) => Unit::Money,
            Self::Number(_) => Unit::Number,
            Self::Rate(_) => Unit::Percent,
        }
    }
}

/// Per-group aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Metric {
    Count,
    Sum { field: String },
    /// Share of the group's records satisfying `of`.
    Rate { of: Predicate },
}

/// Grouping dimensions plus the metrics computed per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub keys: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl GroupSpec {
    pub fn new(name: &str, keys: &[&str]) -> Self {
        Self {
            name: name.into(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            metrics: vec![],
        }
    }

    pub fn metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn validate(&self, schema: &Schema) -> Result<(), QueryError> {
        if self.keys.is_empty() {
            return Err(QueryError::InvalidArgument(format!(
                "group spec '{}' has no keys",
                self.name
            )));
        }
        for key in &self.keys {
            require_field(schema, key)?;
        }
        for metric in &self.metrics {
            match metric {
                Metric::Count => {}
                Metric::Sum { field } => {
                    sum_unit(schema, field)?;
                }
                Metric::Rate { of } => {
                    for field in of.fields() {
                        require_field(schema, field)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// A composite group key; one component per grouping field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey(pub Vec<String>);

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub key: GroupKey,
    pub count: u64,
    /// One value per metric, in spec order.
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTable {
    pub name: String,
    pub keys: Vec<String>,
    pub groups: Vec<Group>,
}

impl GroupTable {
    pub fn total_count(&self) -> u64 {
        self.groups.iter().map(|g| g.count).sum()
    }

    /// Look up a single-key group by its value.
    pub fn group(&self, key: &str) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.key.0.len() == 1 && g.key.0[0] == key)
    }
}

/// A single-pass reduction over a whole record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reduction {
    Count,
    Sum { field: String },
    /// Share of the filtered records satisfying `of`.
    Rate { of: Predicate },
}

/// A named scalar total: `reduction` over the records matching `filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarSpec {
    pub name: String,
    #[serde(default)]
    pub filter: Predicate,
    pub reduction: Reduction,
}

impl ScalarSpec {
    pub fn count(name: &str, filter: Predicate) -> Self {
        Self {
            name: name.into(),
            filter,
            reduction: Reduction::Count,
        }
    }

    pub fn sum(name: &str, field: &str, filter: Predicate) -> Self {
        Self {
            name: name.into(),
            filter,
            reduction: Reduction::Sum {
                field: field.into(),
            },
        }
    }

    pub fn rate(name: &str, of: Predicate, filter: Predicate) -> Self {
        Self {
            name: name.into(),
            filter,
            reduction: Reduction::Rate { of },
        }
    }

    pub fn validate(&self, schema: &Schema) -> Result<(), QueryError> {
        for field in self.filter.fields() {
            require_field(schema, field)?;
        }
        match &self.reduction {
            Reduction::Count => Ok(()),
            Reduction::Sum { field } => sum_unit(schema, field).map(|_| ()),
            Reduction::Rate { of } => of.fields().into_iter().try_for_each(|f| require_field(schema, f)),
        }
    }
}

/// The result of a stats run: group tables plus named totals, in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub tables: Vec<GroupTable>,
    pub totals: Vec<(String, Value)>,
}

impl Summary {
    pub fn table(&self, name: &str) -> Option<&GroupTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn total(&self, name: &str) -> Option<&Value> {
        self.totals.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Group `records` by `spec.keys` and compute `spec.metrics` per group.
pub fn aggregate(records: &[Record], spec: &GroupSpec, ctx: &EvalContext<'_>) -> GroupTable {
    struct Acc {
        key: GroupKey,
        count: u64,
        sums: Vec<Decimal>,
        hits: Vec<u64>,
    }

    let sum_units: Vec<Unit> = spec
        .metrics
        .iter()
        .map(|m| match m {
            Metric::Sum { field } => sum_unit(ctx.schema, field).unwrap_or(Unit::Number),
            Metric::Rate { .. } => Unit::Percent,
            Metric::Count => Unit::Count,
        })
        .collect();

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut accs: Vec<Acc> = Vec::new();

    for record in records {
        let key = GroupKey(
            spec.keys
                .iter()
                .map(|field| record.text(field).unwrap_or_else(|| UNSPECIFIED.to_string()))
                .collect(),
        );
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            accs.push(Acc {
                key,
                count: 0,
                sums: vec![Decimal::ZERO; spec.metrics.len()],
                hits: vec![0; spec.metrics.len()],
            });
            accs.len() - 1
        });

        let acc = &mut accs[slot];
        acc.count += 1;
        for (i, metric) in spec.metrics.iter().enumerate() {
            match metric {
                Metric::Count => {}
                Metric::Sum { field } => {
                    if let Some(amount) = record.get(field).and_then(|v| v.as_decimal()) {
                        acc.sums[i] += amount;
                    }
                }
                Metric::Rate { of } => {
                    if of.evaluate(record, ctx) {
                        acc.hits[i] += 1;
                    }
                }
            }
        }
    }

    let groups: Vec<Group> = accs
        .into_iter()
        .map(|acc| {
            let values = spec
                .metrics
                .iter()
                .enumerate()
                .map(|(i, metric)| match metric {
                    Metric::Count => Value::Count(acc.count),
                    Metric::Sum { .. } => decimal_value(sum_units[i], acc.sums[i]),
                    Metric::Rate { .. } => Value::Rate(Rate::new(acc.hits[i], acc.count)),
                })
                .collect();
            Group {
                key: acc.key,
                count: acc.count,
                values,
            }
        })
        .collect();

    debug!(
        table = %spec.name,
        considered = records.len(),
        groups = groups.len(),
        "Aggregated"
    );

    GroupTable {
        name: spec.name.clone(),
        keys: spec.keys.clone(),
        groups,
    }
}

/// Reduce `records` to one scalar in a single pass.
pub fn reduce(records: &[Record], spec: &ScalarSpec, ctx: &EvalContext<'_>) -> Value {
    let considered = records.iter().filter(|r| spec.filter.evaluate(r, ctx));
    match &spec.reduction {
        Reduction::Count => Value::Count(considered.count() as u64),
        Reduction::Sum { field } => {
            let total = considered
                .filter_map(|r| r.get(field).and_then(|v| v.as_decimal()))
                .fold(Decimal::ZERO, |acc, amount| acc + amount);
            decimal_value(sum_unit(ctx.schema, field).unwrap_or(Unit::Number), total)
        }
        Reduction::Rate { of } => {
            let (matching, total) = considered.fold((0u64, 0u64), |(m, t), r| {
                (m + u64::from(of.evaluate(r, ctx)), t + 1)
            });
            Value::Rate(Rate::new(matching, total))
        }
    }
}

fn decimal_value(unit: Unit, amount: Decimal) -> Value {
    match unit {
        Unit::Money => Value::Money(amount),
        _ => Value::Number(amount),
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

/// The unit a sum over `field` produces; non-numeric fields are rejected.
fn sum_unit(schema: &Schema, field: &str) -> Result<Unit, QueryError> {
    require_field(schema, field)?;
    match schema.spec(field).map(|s| s.kind) {
        Some(FieldKind::Money) => Ok(Unit::Money),
        Some(FieldKind::Integer | FieldKind::Number) => Ok(Unit::Number),
        _ => Err(QueryError::UnsupportedField {
            collection: schema.collection.clone(),
            field: field.to_string(),
            usage: "summation".into(),
        }),
    }
}
