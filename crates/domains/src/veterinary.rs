//! Veterinary clinic domain: patients, appointments and vaccinations.

use chrono::NaiveDate;
use dossier_core::{FieldKind, Schema};
use dossier_engine::{
    Cell, GroupSpec, ListTemplate, Metric, Predicate, ScalarSpec, SummaryTemplate, TotalLine, Unit,
};
use serde_json::json;

use crate::domain::{
    Domain, SearchBinding, StatsBinding, TableBinding, ToolInfo, TotalBinding, WindowBinding, at, day,
};

pub const NAME: &str = "veterinary";

pub fn domain() -> Domain {
    Domain {
        name: NAME.into(),
        title: "Veterinary clinic".into(),
        schemas: vec![patients(), appointments(), vaccinations()],
        search: SearchBinding {
            collection: "patients".into(),
            template: ListTemplate::new("patient", "patients", "name")
                .column("species", "species")
                .column("breed", "breed")
                .column("owner", "owner")
                .column("phone", "owner_phone"),
            tool: ToolInfo::new(
                "search_patients",
                "Search patients by name, species, owner name or patient id. \
                 Optionally filter by species or owner.",
            ),
        },
        overdue: WindowBinding {
            collection: "vaccinations".into(),
            date_field: "due_date".into(),
            assignee_field: Some("vet".into()),
            template: ListTemplate::new("vaccination", "vaccinations", "vaccine")
                .column("patient", "patient_name")
                .column("vet", "vet")
                .column("due", "due_date")
                .dated("due_date"),
            tool: ToolInfo::new(
                "get_overdue_vaccinations",
                "List vaccinations past their due date that have not been administered. \
                 Optionally only patients of one vet.",
            ),
        },
        upcoming: WindowBinding {
            collection: "appointments".into(),
            date_field: "scheduled_at".into(),
            assignee_field: None,
            template: ListTemplate::new("appointment", "appointments", "patient_name")
                .column("type", "appointment_type")
                .column("vet", "vet")
                .column("status", "status")
                .column("at", "scheduled_at")
                .dated("scheduled_at"),
            tool: ToolInfo::new(
                "get_upcoming_appointments",
                "List appointments scheduled from today through the next N days (default 7).",
            ),
        },
        stats: stats(),
        sample,
    }
}

fn patients() -> Schema {
    Schema::new("patients")
        .required("name", FieldKind::Text)
        .field("species", FieldKind::Text)
        .field("breed", FieldKind::Text)
        .field("owner", FieldKind::Text)
        .field("owner_phone", FieldKind::Text)
        .field("date_of_birth", FieldKind::Date)
        .searchable(&["id", "name", "species", "owner"])
        .filterable(&["species", "owner"])
}

fn appointments() -> Schema {
    Schema::new("appointments")
        .required("patient_id", FieldKind::Text)
        .field("patient_name", FieldKind::Text)
        .field("vet", FieldKind::Text)
        .field("appointment_type", FieldKind::Text)
        .field("status", FieldKind::Text)
        .field("scheduled_at", FieldKind::Timestamp)
        .field("fee", FieldKind::Money)
        .filterable(&["status", "vet", "appointment_type"])
        .status("status", &["completed", "cancelled", "no-show"])
}

fn vaccinations() -> Schema {
    Schema::new("vaccinations")
        .required("patient_id", FieldKind::Text)
        .field("patient_name", FieldKind::Text)
        .field("vaccine", FieldKind::Text)
        .field("vet", FieldKind::Text)
        .field("due_date", FieldKind::Date)
        .field("status", FieldKind::Text)
        .filterable(&["status", "vet", "vaccine"])
        .status("status", &["administered"])
}

fn stats() -> StatsBinding {
    let no_show = Predicate::equals("status", "no-show");
    let completed = Predicate::equals("status", "completed");
    StatsBinding {
        template: SummaryTemplate::new("Clinic Statistics")
            .groups(
                "Appointments by Type",
                "appointments_by_type",
                vec![Cell::count("{} appointment(s)"), Cell::metric(0, "no-show rate {}")],
            )
            .groups("Appointments by Vet", "appointments_by_vet", vec![Cell::count("{} appointment(s)")])
            .totals(
                "Totals",
                vec![
                    TotalLine::new("Total appointments", "total_appointments", Unit::Count),
                    TotalLine::new("Completed", "completed_appointments", Unit::Count),
                    TotalLine::new("No-show rate", "no_show_rate", Unit::Percent),
                    TotalLine::new("Revenue from completed visits", "completed_revenue", Unit::Money),
                    TotalLine::new("Overdue vaccinations", "overdue_vaccinations", Unit::Count),
                ],
            ),
        tables: vec![
            TableBinding {
                collection: "appointments".into(),
                filter: Predicate::Always,
                spec: GroupSpec::new("appointments_by_type", &["appointment_type"]).metric(Metric::Rate {
                    of: no_show.clone(),
                }),
            },
            TableBinding {
                collection: "appointments".into(),
                filter: Predicate::Always,
                spec: GroupSpec::new("appointments_by_vet", &["vet"]).metric(Metric::Count),
            },
        ],
        totals: vec![
            TotalBinding {
                collection: "appointments".into(),
                spec: ScalarSpec::count("total_appointments", Predicate::Always),
            },
            TotalBinding {
                collection: "appointments".into(),
                spec: ScalarSpec::count("completed_appointments", completed.clone()),
            },
            TotalBinding {
                collection: "appointments".into(),
                spec: ScalarSpec::rate("no_show_rate", no_show, Predicate::Always),
            },
            TotalBinding {
                collection: "appointments".into(),
                spec: ScalarSpec::sum("completed_revenue", "fee", completed),
            },
            TotalBinding {
                collection: "vaccinations".into(),
                spec: ScalarSpec::count("overdue_vaccinations", Predicate::overdue("due_date")),
            },
        ],
        tool: ToolInfo::new(
            "get_clinic_stats",
            "Summarize the clinic: appointments by type with no-show rates, appointments by vet, \
             completed revenue and overdue vaccinations.",
        ),
    }
}

fn sample(today: NaiveDate) -> Vec<(&'static str, Vec<serde_json::Value>)> {
    let d = |offset| day(today, offset);
    let t = |offset, time| at(today, offset, time);
    vec![
        (
            "patients",
            vec![
                json!({"id": "PET-001", "name": "Biscuit", "species": "dog", "breed": "Beagle",
                       "owner": "Maria Gonzalez", "owner_phone": "555-0142", "date_of_birth": "2019-04-12"}),
                json!({"id": "PET-002", "name": "Mittens", "species": "cat", "breed": "Domestic shorthair",
                       "owner": "Tom Becker", "owner_phone": "555-0178", "date_of_birth": "2021-09-30"}),
                json!({"id": "PET-003", "name": "Captain", "species": "parrot", "breed": "African grey",
                       "owner": "Maria Gonzalez", "owner_phone": "555-0142"}),
                json!({"id": "PET-004", "name": "Luna", "species": "dog", "breed": "Border collie",
                       "owner": "Aisha Khan", "owner_phone": "555-0110", "date_of_birth": "2022-01-05"}),
                json!({"id": "PET-005", "name": "Pepper", "species": "rabbit",
                       "owner": "Tom Becker", "owner_phone": "555-0178"}),
            ],
        ),
        (
            "appointments",
            vec![
                json!({"id": "APT-301", "patient_id": "PET-001", "patient_name": "Biscuit", "vet": "Dr. Patel",
                       "appointment_type": "checkup", "status": "completed", "scheduled_at": t(-6, "09:00"),
                       "fee": "65.00"}),
                json!({"id": "APT-302", "patient_id": "PET-002", "patient_name": "Mittens", "vet": "Dr. Okafor",
                       "appointment_type": "dental", "status": "no-show", "scheduled_at": t(-4, "14:30"),
                       "fee": "180.00"}),
                json!({"id": "APT-303", "patient_id": "PET-004", "patient_name": "Luna", "vet": "Dr. Patel",
                       "appointment_type": "checkup", "status": "no-show", "scheduled_at": t(-3, "11:00"),
                       "fee": "65.00"}),
                json!({"id": "APT-304", "patient_id": "PET-003", "patient_name": "Captain", "vet": "Dr. Okafor",
                       "appointment_type": "surgery", "status": "completed", "scheduled_at": t(-2, "08:00"),
                       "fee": "420.50"}),
                json!({"id": "APT-305", "patient_id": "PET-001", "patient_name": "Biscuit", "vet": "Dr. Patel",
                       "appointment_type": "vaccination", "status": "scheduled", "scheduled_at": t(0, "15:00"),
                       "fee": "45.00"}),
                json!({"id": "APT-306", "patient_id": "PET-005", "patient_name": "Pepper",
                       "appointment_type": "checkup", "status": "scheduled", "scheduled_at": t(3, "10:30"),
                       "fee": "65.00"}),
                json!({"id": "APT-307", "patient_id": "PET-004", "patient_name": "Luna", "vet": "Dr. Okafor",
                       "appointment_type": "checkup", "status": "completed", "scheduled_at": t(-1, "16:00"),
                       "fee": "65.00"}),
            ],
        ),
        (
            "vaccinations",
            vec![
                json!({"id": "VAC-401", "patient_id": "PET-001", "patient_name": "Biscuit", "vaccine": "Rabies",
                       "vet": "Dr. Patel", "due_date": d(-20), "status": "due"}),
                json!({"id": "VAC-402", "patient_id": "PET-002", "patient_name": "Mittens", "vaccine": "FVRCP",
                       "vet": "Dr. Okafor", "due_date": d(-3), "status": "administered"}),
                json!({"id": "VAC-403", "patient_id": "PET-004", "patient_name": "Luna", "vaccine": "Leptospirosis",
                       "vet": "Dr. Patel", "due_date": d(-1), "status": "due"}),
                json!({"id": "VAC-404", "patient_id": "PET-004", "patient_name": "Luna", "vaccine": "Bordetella",
                       "vet": "Dr. Patel", "due_date": d(10), "status": "due"}),
                json!({"id": "VAC-405", "patient_id": "PET-005", "patient_name": "Pepper", "vaccine": "RHDV2",
                       "due_date": d(-7), "status": "due"}),
            ],
        ),
    ]
}
