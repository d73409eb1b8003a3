//! Date-window evaluator — overdue and upcoming-within-N-days.
//!
//! All comparisons happen on calendar days in one canonical zone chosen by
//! the caller (see `timezone` in the config). Timestamps are reduced to
//! their day in that zone first. A record without a date never matches.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use dossier_core::{FieldKind, QueryError, Record, Schema};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Horizon used when the caller does not pass `days_ahead`.
pub const DEFAULT_HORIZON_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Overdue,
    Upcoming,
}

/// A date predicate anchored at a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub reference_instant: DateTime<Utc>,
    pub horizon_days: u32,
    pub direction: Direction,
}

impl DateWindow {
    pub fn overdue(reference_instant: DateTime<Utc>) -> Self {
        Self {
            reference_instant,
            horizon_days: 0,
            direction: Direction::Overdue,
        }
    }

    /// An upcoming window of `days_ahead` days (default 7).
    ///
    /// Negative or out-of-range horizons are rejected, never clamped.
    pub fn upcoming(
        reference_instant: DateTime<Utc>,
        days_ahead: Option<i64>,
    ) -> Result<Self, QueryError> {
        let horizon_days = match days_ahead {
            None => DEFAULT_HORIZON_DAYS,
            Some(days) if days < 0 => {
                return Err(QueryError::InvalidArgument(format!(
                    "days_ahead must be a non-negative integer, got {days}"
                )));
            }
            Some(days) => u32::try_from(days).map_err(|_| {
                QueryError::InvalidArgument(format!("days_ahead is out of range: {days}"))
            })?,
        };
        Ok(Self {
            reference_instant,
            horizon_days,
            direction: Direction::Upcoming,
        })
    }

    /// The reference day in `zone`.
    pub fn today(&self, zone: &FixedOffset) -> NaiveDate {
        today(self.reference_instant, zone)
    }

    /// Last day (inclusive) of an upcoming window, if representable.
    pub fn end(&self, zone: &FixedOffset) -> Option<NaiveDate> {
        self.today(zone)
            .checked_add_days(Days::new(u64::from(self.horizon_days)))
    }
}

/// The calendar day of `instant` in `zone`.
pub fn today(instant: DateTime<Utc>, zone: &FixedOffset) -> NaiveDate {
    instant.with_timezone(zone).date_naive()
}

/// How a dated record relates to a reference day and horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowClass {
    Overdue,
    Upcoming,
    Neither,
}

/// Evaluates windows against one date field of one collection.
#[derive(Debug, Clone)]
pub struct WindowEvaluator<'a> {
    schema: &'a Schema,
    date_field: &'a str,
    zone: FixedOffset,
}

impl<'a> WindowEvaluator<'a> {
    /// Fails if `date_field` is not a declared date or timestamp field.
    pub fn new(schema: &'a Schema, date_field: &'a str, zone: FixedOffset) -> Result<Self, QueryError> {
        match schema.spec(date_field).map(|s| s.kind) {
            Some(FieldKind::Date | FieldKind::Timestamp) => Ok(Self {
                schema,
                date_field,
                zone,
            }),
            Some(_) => Err(QueryError::UnsupportedField {
                collection: schema.collection.clone(),
                field: date_field.to_string(),
                usage: "date windows".into(),
            }),
            None => Err(QueryError::UnknownField {
                collection: schema.collection.clone(),
                field: date_field.to_string(),
            }),
        }
    }

    /// The record's date in the canonical zone, if it has one.
    pub fn date_of(&self, record: &Record) -> Option<NaiveDate> {
        record.get(self.date_field)?.day_in(&self.zone)
    }

    pub fn is_terminal(&self, record: &Record) -> bool {
        self.schema
            .status_field
            .as_deref()
            .and_then(|field| record.text(field))
            .is_some_and(|status| self.schema.is_terminal(&status))
    }

    /// `date < today` and the status is not terminal.
    pub fn is_overdue(&self, record: &Record, today: NaiveDate) -> bool {
        self.date_of(record)
            .is_some_and(|date| date < today && !self.is_terminal(record))
    }

    /// `today <= date <= today + horizon_days`.
    pub fn is_upcoming(&self, record: &Record, today: NaiveDate, horizon_days: u32) -> bool {
        let Some(end) = today.checked_add_days(Days::new(u64::from(horizon_days))) else {
            return false;
        };
        self.date_of(record)
            .is_some_and(|date| today <= date && date <= end)
    }

    pub fn in_window(&self, record: &Record, window: &DateWindow) -> bool {
        let today = window.today(&self.zone);
        match window.direction {
            Direction::Overdue => self.is_overdue(record, today),
            Direction::Upcoming => self.is_upcoming(record, today, window.horizon_days),
        }
    }

    pub fn classify(&self, record: &Record, today: NaiveDate, horizon_days: u32) -> WindowClass {
        if self.is_overdue(record, today) {
            WindowClass::Overdue
        } else if self.is_upcoming(record, today, horizon_days) {
            WindowClass::Upcoming
        } else {
            WindowClass::Neither
        }
    }

    /// Records inside `window`, in store order.
    pub fn select(&self, records: &[Record], window: &DateWindow) -> Result<Vec<Record>, QueryError> {
        if window.direction == Direction::Upcoming && window.end(&self.zone).is_none() {
            return Err(QueryError::InvalidArgument(format!(
                "days_ahead is out of range: {}",
                window.horizon_days
            )));
        }
        let selected: Vec<Record> = records
            .iter()
            .filter(|record| self.in_window(record, window))
            .cloned()
            .collect();
        debug!(
            collection = %self.schema.collection,
            field = self.date_field,
            direction = ?window.direction,
            horizon_days = window.horizon_days,
            considered = records.len(),
            matched = selected.len(),
            "Date window evaluated"
        );
        Ok(selected)
    }
}

/// Whether `record` falls inside `window` on `date_field`.
///
/// Undeclared or non-date fields never match.
pub fn in_window(
    record: &Record,
    window: &DateWindow,
    schema: &Schema,
    date_field: &str,
    zone: FixedOffset,
) -> bool {
    WindowEvaluator::new(schema, date_field, zone)
        .map(|evaluator| evaluator.in_window(record, window))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::{FieldValue, record::parse_timestamp};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        day(y, m, d).and_hms_opt(0, 0, 0).unwrap().and_utc()
    }

    fn tasks() -> Schema {
        Schema::new("tasks")
            .field("due_date", FieldKind::Date)
            .field("status", FieldKind::Text)
            .field("priority", FieldKind::Integer)
            .status("status", &["done", "completed"])
    }

    fn hearings() -> Schema {
        Schema::new("hearings").field("date", FieldKind::Timestamp)
    }

    fn task(id: &str, due: Option<NaiveDate>, status: &str) -> Record {
        let record = Record::new(id).with("status", FieldValue::text(status));
        match due {
            Some(d) => record.with("due_date", FieldValue::Date(d)),
            None => record,
        }
    }

    #[test]
    fn overdue_excludes_terminal_statuses() {
        let schema = tasks();
        let records = vec![
            task("T-1", Some(day(2024, 1, 1)), "open"),
            task("T-2", Some(day(2024, 1, 2)), "done"),
        ];
        let evaluator = WindowEvaluator::new(&schema, "due_date", utc()).unwrap();
        let overdue = evaluator
            .select(&records, &DateWindow::overdue(at(2024, 6, 1)))
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id(), "T-1");
    }

    #[test]
    fn due_today_is_not_overdue() {
        let schema = tasks();
        let record = task("T-1", Some(day(2024, 6, 1)), "open");
        let window = DateWindow::overdue(at(2024, 6, 1));
        assert!(!in_window(&record, &window, &schema, "due_date", utc()));
    }

    #[test]
    fn upcoming_boundary_is_inclusive() {
        let schema = hearings();
        let hearing = Record::new("H-1").with(
            "date",
            FieldValue::Timestamp(parse_timestamp("2024-06-08T15:00:00Z").unwrap()),
        );
        let reference = parse_timestamp("2024-06-01T09:30:00Z").unwrap();

        let seven = DateWindow::upcoming(reference, Some(7)).unwrap();
        let six = DateWindow::upcoming(reference, Some(6)).unwrap();
        assert!(in_window(&hearing, &seven, &schema, "date", utc()));
        assert!(!in_window(&hearing, &six, &schema, "date", utc()));
    }

    #[test]
    fn zero_horizon_means_today_only() {
        let schema = tasks();
        let today = task("T-1", Some(day(2024, 6, 1)), "open");
        let tomorrow = task("T-2", Some(day(2024, 6, 2)), "open");
        let window = DateWindow::upcoming(at(2024, 6, 1), Some(0)).unwrap();
        assert!(in_window(&today, &window, &schema, "due_date", utc()));
        assert!(!in_window(&tomorrow, &window, &schema, "due_date", utc()));
    }

    #[test]
    fn default_horizon_is_seven_days() {
        let window = DateWindow::upcoming(at(2024, 6, 1), None).unwrap();
        assert_eq!(window.horizon_days, 7);
        assert_eq!(window.end(&utc()), Some(day(2024, 6, 8)));
    }

    #[test]
    fn negative_horizon_is_rejected() {
        let err = DateWindow::upcoming(at(2024, 6, 1), Some(-1)).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(ref m) if m.contains("-1")));
    }

    #[test]
    fn unrepresentable_horizon_is_rejected_by_select() {
        let schema = tasks();
        let window = DateWindow::upcoming(at(2024, 6, 1), Some(i64::from(u32::MAX))).unwrap();
        let evaluator = WindowEvaluator::new(&schema, "due_date", utc()).unwrap();
        assert!(evaluator.select(&[], &window).is_err());
    }

    #[test]
    fn missing_date_never_matches() {
        let schema = tasks();
        let undated = task("T-1", None, "open");
        let reference = at(2024, 6, 1);
        assert!(!in_window(&undated, &DateWindow::overdue(reference), &schema, "due_date", utc()));
        for days in [0, 7, 365] {
            let window = DateWindow::upcoming(reference, Some(days)).unwrap();
            assert!(!in_window(&undated, &window, &schema, "due_date", utc()));
        }
    }

    #[test]
    fn non_date_field_is_rejected() {
        let schema = tasks();
        let err = WindowEvaluator::new(&schema, "priority", utc()).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedField { .. }));
        let err = WindowEvaluator::new(&schema, "hearing_on", utc()).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));
    }

    #[test]
    fn timestamps_use_the_canonical_zone() {
        let schema = hearings();
        // 23:30 UTC on June 7 is already June 8 in UTC+09:00.
        let hearing = Record::new("H-1").with(
            "date",
            FieldValue::Timestamp(parse_timestamp("2024-06-07T23:30:00Z").unwrap()),
        );
        let reference = at(2024, 6, 1);
        let window = DateWindow::upcoming(reference, Some(6)).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert!(in_window(&hearing, &window, &schema, "date", utc()));
        // Reference day in Tokyo is still June 1, so June 8 is one day past the horizon.
        assert!(!in_window(&hearing, &window, &schema, "date", tokyo));
    }

    #[test]
    fn classification_partitions_and_is_monotonic_in_horizon() {
        let schema = tasks();
        let evaluator = WindowEvaluator::new(&schema, "due_date", utc()).unwrap();
        let today = day(2024, 6, 1);
        let records: Vec<Record> = (-10i64..20)
            .map(|offset| {
                let date = if offset < 0 {
                    today.checked_sub_days(Days::new(offset.unsigned_abs())).unwrap()
                } else {
                    today.checked_add_days(Days::new(offset as u64)).unwrap()
                };
                let status = if offset % 3 == 0 { "done" } else { "open" };
                task(&format!("T{offset}"), Some(date), status)
            })
            .collect();

        for record in &records {
            let mut was_upcoming = false;
            for horizon in 0..25 {
                let class = evaluator.classify(record, today, horizon);
                let overdue = evaluator.is_overdue(record, today);
                let upcoming = evaluator.is_upcoming(record, today, horizon);
                assert!(!(overdue && upcoming));
                match class {
                    WindowClass::Overdue => assert!(overdue),
                    WindowClass::Upcoming => assert!(upcoming),
                    WindowClass::Neither => assert!(!overdue && !upcoming),
                }
                if was_upcoming {
                    assert!(upcoming, "growing the horizon removed {}", record.id());
                }
                was_upcoming = upcoming;
            }
        }
    }
}
