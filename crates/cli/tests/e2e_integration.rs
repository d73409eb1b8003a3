//! End-to-end integration tests for Dossier.
//!
//! These tests drive the full pipeline a tool-calling client sees:
//! JSONL files on disk → file store → domain service → engine → report text,
//! through the tool registry, with a pinned clock.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use dossier_config::AppConfig;
use dossier_core::clock::FixedClock;
use dossier_core::error::ToolError;
use dossier_core::tool::{ToolCall, ToolRegistry};
use dossier_domains::{Domain, DomainService, ServiceOptions, billing, builtin, legal, veterinary};
use dossier_store::FileStore;
use serde_json::json;

// ── Harness ─────────────────────────────────────────────────────────────

fn instant(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

fn write_jsonl(dir: &Path, collection: &str, rows: &[serde_json::Value]) {
    let content: String = rows.iter().map(|row| format!("{row}\n")).collect();
    std::fs::write(dir.join(format!("{collection}.jsonl")), content).unwrap();
}

fn registry_over(dir: &Path, domains: Vec<Domain>, now: DateTime<Utc>, options: ServiceOptions) -> ToolRegistry {
    let store = Arc::new(FileStore::new(dir, domains.iter().flat_map(|d| d.schemas.clone())));
    let clock = Arc::new(FixedClock(now));
    let services: Vec<Arc<DomainService>> = domains
        .into_iter()
        .map(|d| Arc::new(DomainService::new(Arc::new(d), store.clone(), clock.clone(), options.clone())))
        .collect();
    dossier_tools::default_registry(&services)
}

fn legal_registry(dir: &Path) -> ToolRegistry {
    registry_over(dir, vec![legal::domain()], instant("2024-06-01T09:00:00Z"), ServiceOptions::default())
}

fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: format!("call_{name}"),
        name: name.into(),
        arguments,
    }
}

fn seed_legal(dir: &Path) {
    write_jsonl(
        dir,
        "cases",
        &[
            json!({"id": "CASE-5", "title": "Estate of Moore", "client": "Ann Moore", "case_type": "probate", "status": "open"}),
            json!({"id": "CASE-1", "title": "Smith v. Jones", "client": "Alice Smith", "case_type": "litigation", "status": "Open"}),
            json!({"id": "CASE-3", "title": "Acme merger", "client": "Acme Corp", "case_type": "corporate", "status": "closed"}),
            json!({"id": "CASE-2", "title": "Lee divorce", "client": "Kim Lee", "case_type": "family"}),
            json!({"id": "CASE-4", "title": "Patel lease", "client": "Raj Patel", "case_type": "real_estate", "status": "pending"}),
        ],
    );
    write_jsonl(
        dir,
        "tasks",
        &[
            json!({"id": "T-1", "description": "File motion", "case_id": "CASE-1", "assigned_to": "Dana Reyes", "due_date": "2024-01-01", "status": "open"}),
            json!({"id": "T-2", "description": "Send letter", "case_id": "CASE-1", "assigned_to": "Dana Reyes", "due_date": "2024-01-02", "status": "done"}),
        ],
    );
    write_jsonl(
        dir,
        "hearings",
        &[
            json!({"id": "H-1", "case_id": "CASE-1", "hearing_type": "Motion hearing", "court": "District 4", "date": "2024-06-08"}),
            json!({"id": "H-2", "case_id": "CASE-5", "hearing_type": "Probate review", "court": "Probate", "date": "2024-07-15"}),
        ],
    );
}

// ── E2E: Search ─────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_empty_query_lists_every_record_in_store_order() {
    let dir = tempfile::tempdir().unwrap();
    seed_legal(dir.path());
    let registry = legal_registry(dir.path());

    let result = registry
        .execute(&call("search_cases", json!({"query": ""})))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.data.unwrap()["matches"], 5);
    let ids: Vec<&str> = result
        .output
        .lines()
        .skip(1)
        .map(|line| line.trim_start_matches("- ").split(':').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["CASE-5", "CASE-1", "CASE-3", "CASE-2", "CASE-4"]);
    assert!(result.output.contains("- CASE-2: Lee divorce | client: Kim Lee | type: family | status: unspecified"));
}

#[tokio::test]
async fn e2e_search_filters_are_case_insensitive_sets() {
    let dir = tempfile::tempdir().unwrap();
    seed_legal(dir.path());
    let registry = legal_registry(dir.path());

    let result = registry
        .execute(&call(
            "search_cases",
            json!({"query": "", "filters": {"status": ["OPEN", "pending"]}}),
        ))
        .await
        .unwrap();
    assert_eq!(result.data.unwrap()["matches"], 3);
    assert!(result.output.starts_with("Found 3 cases with filters status=OPEN|pending:"));

    let none = registry
        .execute(&call("search_cases", json!({"query": "zzz", "filters": {"status": "open"}})))
        .await
        .unwrap();
    assert!(none.success);
    assert_eq!(none.output, "No cases found matching \"zzz\" with filters status=open.");
}

// ── E2E: Date windows ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_overdue_skips_terminal_tasks() {
    let dir = tempfile::tempdir().unwrap();
    seed_legal(dir.path());
    let registry = legal_registry(dir.path());

    let result = registry
        .execute(&call("get_overdue_tasks", json!({})))
        .await
        .unwrap();

    assert_eq!(result.data.unwrap()["matches"], 1);
    let lines: Vec<&str> = result.output.lines().collect();
    assert_eq!(lines[0], "Found 1 overdue task as of 2024-06-01:");
    assert!(lines[1].starts_with("- T-1: File motion"));
    assert!(lines[1].ends_with("(152 days overdue)"));
}

#[tokio::test]
async fn e2e_upcoming_boundary_is_inclusive() {
    let dir = tempfile::tempdir().unwrap();
    seed_legal(dir.path());
    let registry = legal_registry(dir.path());

    let seven = registry
        .execute(&call("get_upcoming_hearings", json!({"days_ahead": 7})))
        .await
        .unwrap();
    assert_eq!(seven.data.unwrap()["matches"], 1);
    assert!(seven.output.contains("- H-1: Motion hearing"));
    assert!(seven.output.contains("(in 7 days)"));

    let six = registry
        .execute(&call("get_upcoming_hearings", json!({"days_ahead": 6})))
        .await
        .unwrap();
    assert_eq!(six.output, "No hearings in the next 6 days (2024-06-01 to 2024-06-07).");
}

#[tokio::test]
async fn e2e_configured_zone_decides_today() {
    let dir = tempfile::tempdir().unwrap();
    seed_legal(dir.path());
    write_jsonl(
        dir.path(),
        "hearings",
        &[json!({"id": "H-9", "hearing_type": "Arraignment", "date": "2024-05-31"})],
    );

    // 03:00 UTC on June 1st is still May 31st at UTC-05:00.
    let options = ServiceOptions {
        zone: FixedOffset::west_opt(5 * 3600).unwrap(),
        ..ServiceOptions::default()
    };
    let registry = registry_over(dir.path(), vec![legal::domain()], instant("2024-06-01T03:00:00Z"), options);

    let result = registry
        .execute(&call("get_upcoming_hearings", json!({"days_ahead": 0})))
        .await
        .unwrap();
    assert!(result.output.starts_with("Found 1 hearing in the next 0 days (2024-05-31 to 2024-05-31):"));
    assert!(result.output.contains("(today)"));
}

// ── E2E: Stats ──────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_grouped_revenue_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    write_jsonl(
        dir.path(),
        "customers",
        &[
            json!({"id": "C-1", "name": "Alpha", "plan": "pro", "status": "active", "mrr": "10.00"}),
            json!({"id": "C-2", "name": "Beta", "plan": "team", "status": "active", "mrr": 20.00}),
            json!({"id": "C-3", "name": "Gamma", "status": "trialing", "mrr": "0.00"}),
        ],
    );
    write_jsonl(dir.path(), "invoices", &[]);
    write_jsonl(dir.path(), "payments", &[]);
    let registry = registry_over(
        dir.path(),
        vec![billing::domain()],
        instant("2024-06-01T09:00:00Z"),
        ServiceOptions::default(),
    );

    let result = registry
        .execute(&call("get_billing_stats", json!({})))
        .await
        .unwrap();

    assert!(result.output.starts_with("Billing Statistics (as of 2024-06-01)"));
    assert!(result.output.contains("  pro: $10.00 MRR, 1 customer(s)"));
    assert!(result.output.contains("  team: $20.00 MRR, 1 customer(s)"));
    assert!(result.output.contains("  unspecified: $0.00 MRR, 1 customer(s)"));
    assert!(result.output.contains("  Total MRR: $30.00"));
    assert!(result.output.contains("  Active customers: 2"));
}

#[tokio::test]
async fn e2e_clinic_stats_report_no_show_rate() {
    let dir = tempfile::tempdir().unwrap();
    write_jsonl(dir.path(), "patients", &[]);
    write_jsonl(
        dir.path(),
        "appointments",
        &[
            json!({"id": "A-1", "patient_id": "P-1", "patient_name": "Rex", "vet": "Dr. Chen", "appointment_type": "checkup", "status": "completed", "fee": "80.00"}),
            json!({"id": "A-2", "patient_id": "P-2", "patient_name": "Tom", "vet": "Dr. Chen", "appointment_type": "checkup", "status": "no-show"}),
            json!({"id": "A-3", "patient_id": "P-3", "patient_name": "Bo", "vet": "Dr. Ali", "appointment_type": "surgery", "status": "completed", "fee": "450.50"}),
        ],
    );
    write_jsonl(dir.path(), "vaccinations", &[]);
    let registry = registry_over(
        dir.path(),
        vec![veterinary::domain()],
        instant("2024-06-01T09:00:00Z"),
        ServiceOptions::default(),
    );

    let result = registry
        .execute(&call("get_clinic_stats", json!({})))
        .await
        .unwrap();
    assert!(result.output.contains("  checkup: 2 appointment(s), no-show rate 50.0% (1 of 2)"));
    assert!(result.output.contains("  surgery: 1 appointment(s), no-show rate 0.0% (0 of 1)"));
    assert!(result.output.contains("$530.50"));
}

// ── E2E: Store failures ─────────────────────────────────────────────────

#[tokio::test]
async fn e2e_missing_data_is_unavailable_not_empty() {
    let dir = tempfile::tempdir().unwrap();
    let registry = legal_registry(&dir.path().join("nowhere"));

    let err = registry
        .execute(&call("search_cases", json!({"query": "smith"})))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::StoreUnavailable { tool_name, .. } if tool_name == "search_cases"));
}

#[tokio::test]
async fn e2e_corrupt_line_names_its_position() {
    let dir = tempfile::tempdir().unwrap();
    seed_legal(dir.path());
    std::fs::write(
        dir.path().join("tasks.jsonl"),
        "{\"id\": \"T-1\", \"description\": \"ok\"}\n\n{not json}\n",
    )
    .unwrap();
    let registry = legal_registry(dir.path());

    let err = registry
        .execute(&call("get_overdue_tasks", json!({})))
        .await
        .unwrap_err();
    match err {
        ToolError::StoreUnavailable { reason, .. } => assert!(reason.contains("line 3"), "{reason}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

// ── E2E: Arguments ──────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_invalid_arguments_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    seed_legal(dir.path());
    let registry = legal_registry(dir.path());

    for (tool, args) in [
        ("search_cases", json!({})),
        ("search_cases", json!({"query": "", "filters": {"client": "Alice Smith"}})),
        ("get_upcoming_hearings", json!({"days_ahead": -1})),
        ("get_overdue_tasks", json!({"assigned_to": 42})),
    ] {
        let err = registry.execute(&call(tool, args.clone())).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)), "{tool} {args}: {err:?}");
    }
}

// ── E2E: Sample data round trip ─────────────────────────────────────────

#[tokio::test]
async fn e2e_written_samples_serve_every_tool() {
    let dir = tempfile::tempdir().unwrap();
    let domains = builtin();
    let today = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    let store = FileStore::new(dir.path(), domains.iter().flat_map(|d| d.schemas.clone()));
    for domain in &domains {
        for (collection, records) in domain.sample_records(today).unwrap() {
            store.write_collection(&collection, &records).await.unwrap();
        }
    }
    assert!(store.missing_collections().is_empty());

    let registry = registry_over(dir.path(), domains, instant("2024-06-01T12:00:00Z"), ServiceOptions::default());
    assert_eq!(registry.len(), 12);
    for name in registry.names() {
        let args = if name.starts_with("search_") {
            json!({"query": ""})
        } else {
            json!({})
        };
        let result = registry.execute(&call(name, args)).await.unwrap();
        assert!(result.success, "{name}");
        assert!(!result.output.is_empty(), "{name}");
    }

    let overdue = registry
        .execute(&call("get_overdue_invoices", json!({"assigned_to": "Jordan Blake"})))
        .await
        .unwrap();
    assert_eq!(overdue.data.unwrap()["matches"], 2);
}

// ── E2E: Configuration System ───────────────────────────────────────────

#[test]
fn e2e_config_file_and_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
timezone = "+05:30"
currency = "€"

[store]
backend = "file"
data_dir = "/srv/dossier"

[domains.veterinary]
enabled = false

[domains.legal.terminal_statuses]
tasks = ["done", "waived"]
"#,
    )
    .unwrap();

    let mut config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.zone().unwrap(), FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap());
    assert!(!config.domain_enabled("veterinary"));
    assert!(config.domain_enabled("billing"));
    assert!(config.validate_domains(&dossier_domains::DOMAIN_NAMES).is_ok());

    config.apply_env(|key| match key {
        "DOSSIER_TIMEZONE" => Some("-08:00".into()),
        _ => None,
    });
    assert_eq!(config.zone().unwrap(), FixedOffset::west_opt(8 * 3600).unwrap());
    assert!(config.validate().is_ok());

    let mut legal = legal::domain();
    legal
        .set_terminal_statuses("tasks", &config.domains["legal"].terminal_statuses["tasks"])
        .unwrap();
    assert!(legal.schema("tasks").unwrap().is_terminal("WAIVED"));
    assert!(!legal.schema("tasks").unwrap().is_terminal("completed"));
}

#[test]
fn e2e_default_config_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, AppConfig::default_toml()).unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.currency, "$");
    assert_eq!(config.default_days_ahead, 7);
    assert_eq!(config.store.backend, "memory");
    assert!(config.validate().is_ok());
}
