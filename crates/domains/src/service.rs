//! DomainService — the per-domain operation surface.
//!
//! Each operation takes exactly one snapshot from the record store, reads
//! the reference instant once from the clock, runs the engine stages and
//! formats the result. Nothing is cached between calls.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use dossier_core::{Clock, Error, QueryError, Record, RecordStore, Schema, SchemaError, categorical_eq};
use dossier_engine::{
    Criteria, DEFAULT_HORIZON_DAYS, DateWindow, Direction, EvalContext, FormatOptions, Payload, Query,
    Report, Summary, WindowEvaluator, aggregate, format, reduce, search, today,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{Domain, WindowBinding};

/// Settings shared by every operation of a service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Canonical zone for all day comparisons.
    pub zone: FixedOffset,
    /// Currency marker for money rendering.
    pub currency: String,
    /// Horizon used when `days_ahead` is omitted.
    pub default_days_ahead: u32,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            zone: Utc.fix(),
            currency: "$".into(),
            default_days_ahead: DEFAULT_HORIZON_DAYS,
        }
    }
}

/// A formatted report plus how many records (or groups) it covers.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub report: Report,
    pub matches: usize,
}

pub struct DomainService {
    domain: Arc<Domain>,
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    options: ServiceOptions,
}

impl DomainService {
    pub fn new(
        domain: Arc<Domain>,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            domain,
            store,
            clock,
            options,
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    fn format_options(&self) -> FormatOptions {
        FormatOptions {
            currency: self.options.currency.clone(),
            zone: self.options.zone,
        }
    }

    fn schema(&self, collection: &str) -> Result<&Schema, Error> {
        self.domain.schema(collection).ok_or_else(|| {
            Error::Schema(SchemaError::InvalidSchema {
                collection: collection.to_string(),
                reason: format!("collection is not declared by domain '{}'", self.domain.name),
            })
        })
    }

    fn window_binding(&self, direction: Direction) -> &WindowBinding {
        match direction {
            Direction::Overdue => &self.domain.overdue,
            Direction::Upcoming => &self.domain.upcoming,
        }
    }

    // ── Store-facing operations ──────────────────────────────────────────

    /// Records of the search collection matching `query`, in store order.
    pub async fn search_records(&self, query: &Query) -> Result<Vec<Record>, Error> {
        let collection = self.domain.search.collection.as_str();
        let schema = self.schema(collection)?;
        query.validate(schema)?;

        let snapshot = self.store.snapshot(&[collection]).await?;
        Ok(search(query, snapshot.collection(collection)?, schema)?)
    }

    /// Records inside `window` on the domain's overdue or upcoming binding.
    pub async fn find_by_date_window(&self, window: &DateWindow) -> Result<Vec<Record>, Error> {
        let binding = self.window_binding(window.direction);
        let schema = self.schema(&binding.collection)?;
        let evaluator = WindowEvaluator::new(schema, &binding.date_field, self.options.zone)?;

        let snapshot = self.store.snapshot(&[binding.collection.as_str()]).await?;
        Ok(evaluator.select(snapshot.collection(&binding.collection)?, window)?)
    }

    /// Group tables and totals of the stats binding, as of now.
    pub async fn compute_stats(&self) -> Result<Summary, Error> {
        self.compute_stats_at(self.clock.now()).await
    }

    async fn compute_stats_at(&self, reference_instant: DateTime<Utc>) -> Result<Summary, Error> {
        let stats = &self.domain.stats;
        let snapshot = self.store.snapshot(&stats.collections()).await?;
        let zone = self.options.zone;

        let mut summary = Summary::default();
        for table in &stats.tables {
            let schema = self.schema(&table.collection)?;
            table.spec.validate(schema)?;
            let ctx = EvalContext::new(schema, reference_instant, zone);
            let records: Vec<Record> = snapshot
                .collection(&table.collection)?
                .iter()
                .filter(|r| table.filter.evaluate(r, &ctx))
                .cloned()
                .collect();
            summary.tables.push(aggregate(&records, &table.spec, &ctx));
        }
        for total in &stats.totals {
            let schema = self.schema(&total.collection)?;
            total.spec.validate(schema)?;
            let ctx = EvalContext::new(schema, reference_instant, zone);
            let value = reduce(snapshot.collection(&total.collection)?, &total.spec, &ctx);
            summary.totals.push((total.spec.name.clone(), value));
        }
        Ok(summary)
    }

    // ── Report operations ────────────────────────────────────────────────

    /// `search { query, filters? }`
    pub async fn search(&self, query: &Query) -> Result<QueryOutcome, Error> {
        let records = self.search_records(query).await?;
        debug!(domain = %self.domain.name, matches = records.len(), "search");

        let criteria = Criteria::Search {
            text: query.text.clone(),
            filters: query.describe_filters(),
        };
        Ok(self.list_outcome(&records, &self.domain.search.template, &criteria))
    }

    /// `overdue-items { assigned_to? }`. A blank assignee means no filter.
    pub async fn overdue_items(&self, assigned_to: Option<&str>) -> Result<QueryOutcome, Error> {
        let assigned_to = assigned_to.map(str::trim).filter(|who| !who.is_empty());
        let binding = &self.domain.overdue;
        if assigned_to.is_some() && binding.assignee_field.is_none() {
            return Err(QueryError::InvalidArgument(format!(
                "{} does not support filtering {} by assignee",
                self.domain.name, binding.collection
            ))
            .into());
        }

        let now = self.clock.now();
        let mut records = self.find_by_date_window(&DateWindow::overdue(now)).await?;
        if let (Some(who), Some(field)) = (assigned_to, &binding.assignee_field) {
            records.retain(|r| r.text(field).is_some_and(|v| categorical_eq(&v, who)));
        }
        debug!(domain = %self.domain.name, assigned_to = ?assigned_to, matches = records.len(), "overdue");

        let criteria = Criteria::Overdue {
            today: today(now, &self.options.zone),
            assigned_to: assigned_to.map(String::from),
        };
        Ok(self.list_outcome(&records, &binding.template, &criteria))
    }

    /// `upcoming-window { days_ahead? }`
    pub async fn upcoming_window(&self, days_ahead: Option<i64>) -> Result<QueryOutcome, Error> {
        let now = self.clock.now();
        let days = days_ahead.unwrap_or(i64::from(self.options.default_days_ahead));
        let window = DateWindow::upcoming(now, Some(days))?;
        let zone = self.options.zone;
        let end = window.end(&zone).ok_or_else(|| {
            QueryError::InvalidArgument(format!("days_ahead is out of range: {days}"))
        })?;

        let records = self.find_by_date_window(&window).await?;
        debug!(domain = %self.domain.name, days, matches = records.len(), "upcoming");

        let criteria = Criteria::Upcoming {
            today: window.today(&zone),
            end,
            days: window.horizon_days,
        };
        Ok(self.list_outcome(&records, &self.domain.upcoming.template, &criteria))
    }

    /// `stats-summary {}`
    pub async fn stats_summary(&self) -> Result<QueryOutcome, Error> {
        let now = self.clock.now();
        let summary = self.compute_stats_at(now).await?;
        let groups: usize = summary.tables.iter().map(|t| t.groups.len()).sum();
        info!(domain = %self.domain.name, tables = summary.tables.len(), groups, "Stats computed");

        let report = format(
            Payload::Summary {
                summary: &summary,
                template: &self.domain.stats.template,
                today: today(now, &self.options.zone),
            },
            &self.format_options(),
        );
        Ok(QueryOutcome {
            report,
            matches: groups,
        })
    }

    fn list_outcome(
        &self,
        records: &[Record],
        template: &dossier_engine::ListTemplate,
        criteria: &Criteria,
    ) -> QueryOutcome {
        let report = format(
            Payload::List {
                records,
                template,
                criteria,
            },
            &self.format_options(),
        );
        QueryOutcome {
            report,
            matches: records.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{billing, legal, veterinary};
    use dossier_core::{FieldValue, FixedClock, StoreError};
    use dossier_engine::ReportKind;
    use dossier_store::{InMemoryStore, UnavailableStore};
    use std::str::FromStr;

    fn clock(y: i32, m: u32, d: u32) -> Arc<dyn Clock> {
        Arc::new(FixedClock::ymd(y, m, d).unwrap())
    }

    fn service(domain: Domain, store: InMemoryStore, clock: Arc<dyn Clock>) -> DomainService {
        DomainService::new(Arc::new(domain), Arc::new(store), clock, ServiceOptions::default())
    }

    fn text(value: &str) -> FieldValue {
        FieldValue::text(value)
    }

    fn date(value: &str) -> FieldValue {
        FieldValue::Date(value.parse().unwrap())
    }

    fn money(value: &str) -> FieldValue {
        FieldValue::Money(rust_decimal::Decimal::from_str(value).unwrap())
    }

    fn legal_store() -> InMemoryStore {
        InMemoryStore::new()
            .with_collection("cases", vec![])
            .with_collection(
                "tasks",
                vec![
                    Record::new("T-1")
                        .with("description", text("File brief"))
                        .with("due_date", date("2024-01-01"))
                        .with("status", text("open"))
                        .with("assigned_to", text("Dana Reyes")),
                    Record::new("T-2")
                        .with("description", text("Call client"))
                        .with("due_date", date("2024-01-02"))
                        .with("status", text("done"))
                        .with("assigned_to", text("Dana Reyes")),
                    Record::new("T-3")
                        .with("description", text("Draft reply"))
                        .with("due_date", date("2024-05-20"))
                        .with("status", text("open"))
                        .with("assigned_to", text("Sam Ortiz")),
                ],
            )
            .with_collection(
                "hearings",
                vec![
                    Record::new("H-1")
                        .with("hearing_type", text("Motion"))
                        .with("date", date("2024-06-08")),
                    Record::new("H-2")
                        .with("hearing_type", text("Status"))
                        .with("date", date("2024-06-01")),
                    Record::new("H-3").with("hearing_type", text("Unscheduled")),
                ],
            )
    }

    #[tokio::test]
    async fn overdue_excludes_terminal_statuses() {
        let svc = service(legal::domain(), legal_store(), clock(2024, 6, 1));
        let records = svc
            .find_by_date_window(&DateWindow::overdue(svc.clock.now()))
            .await
            .unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["T-1", "T-3"]);
    }

    #[tokio::test]
    async fn overdue_filters_by_assignee_case_insensitively() {
        let svc = service(legal::domain(), legal_store(), clock(2024, 6, 1));
        let outcome = svc.overdue_items(Some("  dana reyes ")).await.unwrap();
        assert_eq!(outcome.matches, 1);
        assert_eq!(outcome.report.kind, ReportKind::OverdueItems);
        assert!(outcome.report.body[0].contains("assigned to dana reyes"));
        assert!(outcome.report.body[1].starts_with("- T-1: File brief"));
    }

    #[tokio::test]
    async fn blank_assignee_means_no_filter() {
        let svc = service(legal::domain(), legal_store(), clock(2024, 6, 1));
        assert_eq!(svc.overdue_items(Some("   ")).await.unwrap().matches, 2);
    }

    #[tokio::test]
    async fn upcoming_boundary_is_inclusive() {
        let svc = service(legal::domain(), legal_store(), clock(2024, 6, 1));
        let seven = svc.upcoming_window(Some(7)).await.unwrap();
        let six = svc.upcoming_window(Some(6)).await.unwrap();
        let today_only = svc.upcoming_window(Some(0)).await.unwrap();
        assert_eq!(seven.matches, 2);
        assert_eq!(six.matches, 1);
        assert_eq!(today_only.matches, 1);
        assert!(today_only.report.body[1].contains("(today)"));
    }

    #[tokio::test]
    async fn upcoming_defaults_to_configured_horizon() {
        let svc = service(legal::domain(), legal_store(), clock(2024, 6, 1));
        let outcome = svc.upcoming_window(None).await.unwrap();
        assert!(outcome.report.body[0].contains("in the next 7 days (2024-06-01 to 2024-06-08)"));
    }

    #[tokio::test]
    async fn negative_days_ahead_is_rejected() {
        let svc = service(legal::domain(), legal_store(), clock(2024, 6, 1));
        let err = svc.upcoming_window(Some(-1)).await.unwrap_err();
        assert!(matches!(err, Error::Query(QueryError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn empty_overdue_report_echoes_parameters() {
        let svc = service(legal::domain(), legal_store(), clock(2023, 12, 1));
        let outcome = svc.overdue_items(None).await.unwrap();
        assert_eq!(outcome.matches, 0);
        assert_eq!(outcome.report.text(), "No overdue tasks as of 2023-12-01.");
    }

    #[tokio::test]
    async fn mrr_by_plan_keeps_unspecified_bucket() {
        let store = InMemoryStore::new()
            .with_collection(
                "customers",
                vec![
                    Record::new("C-1").with("name", text("A")).with("plan", text("pro")).with("mrr", money("10.00")),
                    Record::new("C-2").with("name", text("B")).with("plan", text("team")).with("mrr", money("20.00")),
                    Record::new("C-3").with("name", text("C")).with("mrr", money("0.00")),
                ],
            )
            .with_collection("invoices", vec![])
            .with_collection("payments", vec![]);
        let svc = service(billing::domain(), store, clock(2024, 6, 1));

        let summary = svc.compute_stats().await.unwrap();
        let table = summary.table("mrr_by_plan").unwrap();
        assert_eq!(table.total_count(), 3);
        assert!(table.group("unspecified").is_some());
        assert_eq!(
            summary.total("total_mrr"),
            Some(&dossier_engine::Value::Money(rust_decimal::Decimal::from_str("30.00").unwrap()))
        );

        let text = svc.stats_summary().await.unwrap().report.text();
        assert!(text.contains("  Total MRR: $30.00"));
        assert!(text.contains("  Outstanding invoices: 0"));
        assert!(text.contains("  Outstanding balance: $0.00"));
    }

    #[tokio::test]
    async fn stats_render_every_section_on_empty_store() {
        let store = InMemoryStore::new()
            .with_collection("patients", vec![])
            .with_collection("appointments", vec![])
            .with_collection("vaccinations", vec![]);
        let svc = service(veterinary::domain(), store, clock(2024, 6, 1));
        let report = svc.stats_summary().await.unwrap().report;
        assert_eq!(report.kind, ReportKind::StatsSummary);
        let text = report.text();
        assert!(text.contains("Appointments by Type:\n  (none)"));
        assert!(text.contains("Appointments by Vet:\n  (none)"));
        assert!(text.contains("  No-show rate: 0.0% (0 of 0)"));
        assert!(text.contains("  Revenue from completed visits: $0.00"));
    }

    #[tokio::test]
    async fn sample_stats_are_idempotent() {
        let domain = veterinary::domain();
        let today = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let store = crate::catalog::sample_store(&domain, today).unwrap();
        let svc = service(domain, store, clock(2024, 6, 1));

        let first = svc.stats_summary().await.unwrap();
        let second = svc.stats_summary().await.unwrap();
        assert_eq!(first.report, second.report);
        let text = first.report.text();
        assert!(text.contains("  checkup: 4 appointment(s), no-show rate 25.0% (1 of 4)"));
        assert!(text.contains("  Overdue vaccinations: 3"));
    }

    #[tokio::test]
    async fn unknown_filter_is_a_query_error() {
        let svc = service(legal::domain(), legal_store(), clock(2024, 6, 1));
        let err = svc.search(&Query::default().filter("judge", "Hale")).await.unwrap_err();
        assert!(matches!(err, Error::Query(QueryError::UnknownField { .. })));
    }

    #[tokio::test]
    async fn unavailable_store_is_not_an_empty_result() {
        let svc = DomainService::new(
            Arc::new(legal::domain()),
            Arc::new(UnavailableStore::new("down for maintenance")),
            clock(2024, 6, 1),
            ServiceOptions::default(),
        );
        let err = svc.search(&Query::default()).await.unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::Unavailable { .. })));
    }
}
