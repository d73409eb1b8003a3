//! Legal practice domain: cases, tasks and court hearings.

use chrono::NaiveDate;
use dossier_core::{FieldKind, Schema};
use dossier_engine::{
    Cell, GroupSpec, ListTemplate, Metric, Predicate, ScalarSpec, SummaryTemplate, TotalLine, Unit,
};
use serde_json::json;

use crate::domain::{
    Domain, SearchBinding, StatsBinding, TableBinding, ToolInfo, TotalBinding, WindowBinding, day,
};

pub const NAME: &str = "legal";

pub fn domain() -> Domain {
    Domain {
        name: NAME.into(),
        title: "Legal practice".into(),
        schemas: vec![cases(), tasks(), hearings()],
        search: SearchBinding {
            collection: "cases".into(),
            template: ListTemplate::new("case", "cases", "title")
                .column("client", "client")
                .column("type", "case_type")
                .column("status", "status")
                .column("attorney", "attorney"),
            tool: ToolInfo::new(
                "search_cases",
                "Search legal cases by title, client name, case number or case type. \
                 Optionally filter by status, case_type or attorney.",
            ),
        },
        overdue: WindowBinding {
            collection: "tasks".into(),
            date_field: "due_date".into(),
            assignee_field: Some("assigned_to".into()),
            template: ListTemplate::new("task", "tasks", "description")
                .column("case", "case_id")
                .column("assigned to", "assigned_to")
                .column("priority", "priority")
                .column("due", "due_date")
                .dated("due_date"),
            tool: ToolInfo::new(
                "get_overdue_tasks",
                "List case tasks past their due date that are not done. \
                 Optionally only tasks assigned to one person.",
            ),
        },
        upcoming: WindowBinding {
            collection: "hearings".into(),
            date_field: "date".into(),
            assignee_field: None,
            template: ListTemplate::new("hearing", "hearings", "hearing_type")
                .column("case", "case_id")
                .column("court", "court")
                .column("judge", "judge")
                .column("date", "date")
                .dated("date"),
            tool: ToolInfo::new(
                "get_upcoming_hearings",
                "List court hearings scheduled from today through the next N days (default 7).",
            ),
        },
        stats: stats(),
        sample,
    }
}

fn cases() -> Schema {
    Schema::new("cases")
        .required("title", FieldKind::Text)
        .field("client", FieldKind::Text)
        .field("case_type", FieldKind::Text)
        .field("status", FieldKind::Text)
        .field("attorney", FieldKind::Text)
        .field("opened_on", FieldKind::Date)
        .searchable(&["id", "title", "client", "case_type"])
        .filterable(&["status", "case_type", "attorney"])
        .status("status", &["closed"])
}

fn tasks() -> Schema {
    Schema::new("tasks")
        .required("description", FieldKind::Text)
        .field("case_id", FieldKind::Text)
        .field("assigned_to", FieldKind::Text)
        .field("due_date", FieldKind::Date)
        .field("status", FieldKind::Text)
        .field("priority", FieldKind::Integer)
        .filterable(&["status", "assigned_to", "case_id"])
        .status("status", &["done", "completed"])
}

fn hearings() -> Schema {
    Schema::new("hearings")
        .field("case_id", FieldKind::Text)
        .field("hearing_type", FieldKind::Text)
        .field("court", FieldKind::Text)
        .field("judge", FieldKind::Text)
        .field("date", FieldKind::Date)
        .filterable(&["court", "judge"])
}

fn stats() -> StatsBinding {
    StatsBinding {
        template: SummaryTemplate::new("Legal Practice Statistics")
            .groups("Cases by Status", "cases_by_status", vec![Cell::count("{} case(s)")])
            .groups("Cases by Type", "cases_by_type", vec![Cell::count("{} case(s)")])
            .totals(
                "Totals",
                vec![
                    TotalLine::new("Total cases", "total_cases", Unit::Count),
                    TotalLine::new("Open cases", "open_cases", Unit::Count),
                    TotalLine::new("Overdue tasks", "overdue_tasks", Unit::Count),
                    TotalLine::new("Hearings in the next 7 days", "hearings_this_week", Unit::Count),
                ],
            ),
        tables: vec![
            TableBinding {
                collection: "cases".into(),
                filter: Predicate::Always,
                spec: GroupSpec::new("cases_by_status", &["status"]).metric(Metric::Count),
            },
            TableBinding {
                collection: "cases".into(),
                filter: Predicate::Always,
                spec: GroupSpec::new("cases_by_type", &["case_type"]).metric(Metric::Count),
            },
        ],
        totals: vec![
            TotalBinding {
                collection: "cases".into(),
                spec: ScalarSpec::count("total_cases", Predicate::Always),
            },
            TotalBinding {
                collection: "cases".into(),
                spec: ScalarSpec::count("open_cases", Predicate::equals("status", "open")),
            },
            TotalBinding {
                collection: "tasks".into(),
                spec: ScalarSpec::count("overdue_tasks", Predicate::overdue("due_date")),
            },
            TotalBinding {
                collection: "hearings".into(),
                spec: ScalarSpec::count("hearings_this_week", Predicate::due_within("date", 7)),
            },
        ],
        tool: ToolInfo::new(
            "get_case_stats",
            "Summarize the practice: cases by status and type, open cases, \
             overdue tasks and hearings this week.",
        ),
    }
}

fn sample(today: NaiveDate) -> Vec<(&'static str, Vec<serde_json::Value>)> {
    let d = |offset| day(today, offset);
    vec![
        (
            "cases",
            vec![
                json!({"id": "CASE-2024-001", "title": "Smith v. Jones", "client": "Alice Smith",
                       "case_type": "litigation", "status": "open", "attorney": "Dana Reyes",
                       "opened_on": d(-120)}),
                json!({"id": "CASE-2024-002", "title": "Acme Corp merger review", "client": "Acme Corp",
                       "case_type": "corporate", "status": "open", "attorney": "Marcus Chen",
                       "opened_on": d(-90)}),
                json!({"id": "CASE-2024-003", "title": "Estate of Harold Brown", "client": "Brown family",
                       "case_type": "estate", "status": "closed", "attorney": "Dana Reyes",
                       "opened_on": d(-300)}),
                json!({"id": "CASE-2024-004", "title": "Smithfield lease dispute", "client": "Smithfield LLC",
                       "case_type": "litigation", "status": "pending", "attorney": "Priya Natarajan",
                       "opened_on": d(-45)}),
                json!({"id": "CASE-2024-005", "title": "Lee custody review", "client": "Dana Lee",
                       "case_type": "family", "status": "open", "attorney": "Marcus Chen",
                       "opened_on": d(-20)}),
                json!({"id": "CASE-2024-006", "title": "Trademark opposition", "client": "Northwind Traders",
                       "status": "open", "attorney": "Priya Natarajan", "opened_on": d(-10)}),
            ],
        ),
        (
            "tasks",
            vec![
                json!({"id": "TASK-101", "case_id": "CASE-2024-001", "description": "File motion to compel",
                       "assigned_to": "Dana Reyes", "due_date": d(-5), "status": "open", "priority": 1}),
                json!({"id": "TASK-102", "case_id": "CASE-2024-001", "description": "Draft deposition outline",
                       "assigned_to": "Sam Ortiz", "due_date": d(-2), "status": "done", "priority": 2}),
                json!({"id": "TASK-103", "case_id": "CASE-2024-002", "description": "Review disclosure schedules",
                       "assigned_to": "Marcus Chen", "due_date": d(-1), "status": "in_progress", "priority": 1}),
                json!({"id": "TASK-104", "case_id": "CASE-2024-004", "description": "Serve notice to landlord",
                       "assigned_to": "Sam Ortiz", "due_date": d(0), "status": "open", "priority": 2}),
                json!({"id": "TASK-105", "case_id": "CASE-2024-005", "description": "Collect school records",
                       "assigned_to": "Dana Reyes", "due_date": d(3), "status": "open", "priority": 3}),
                json!({"id": "TASK-106", "case_id": "CASE-2024-006", "description": "Prepare evidence of use",
                       "status": "open", "due_date": d(-8), "priority": 2}),
                json!({"id": "TASK-107", "case_id": "CASE-2024-003", "description": "Final accounting",
                       "assigned_to": "Dana Reyes", "status": "open"}),
            ],
        ),
        (
            "hearings",
            vec![
                json!({"id": "HRG-201", "case_id": "CASE-2024-001", "hearing_type": "Motion hearing",
                       "court": "Superior Court Dept. 12", "judge": "Hon. R. Alvarez", "date": d(2)}),
                json!({"id": "HRG-202", "case_id": "CASE-2024-004", "hearing_type": "Case management conference",
                       "court": "Superior Court Dept. 4", "judge": "Hon. K. Osei", "date": d(7)}),
                json!({"id": "HRG-203", "case_id": "CASE-2024-005", "hearing_type": "Custody mediation",
                       "court": "Family Court", "date": d(15)}),
                json!({"id": "HRG-204", "case_id": "CASE-2024-001", "hearing_type": "Status conference",
                       "court": "Superior Court Dept. 12", "judge": "Hon. R. Alvarez", "date": d(-3)}),
            ],
        ),
    ]
}
