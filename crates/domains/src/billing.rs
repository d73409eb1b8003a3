//! SaaS billing domain: customers, invoices and payments.

use chrono::NaiveDate;
use dossier_core::{FieldKind, Schema};
use dossier_engine::{
    Cell, GroupSpec, ListTemplate, Metric, Predicate, ScalarSpec, SummaryTemplate, TotalLine, Unit,
};
use serde_json::json;

use crate::domain::{
    Domain, SearchBinding, StatsBinding, TableBinding, ToolInfo, TotalBinding, WindowBinding, at, day,
};

pub const NAME: &str = "billing";

pub fn domain() -> Domain {
    Domain {
        name: NAME.into(),
        title: "SaaS billing".into(),
        schemas: vec![customers(), invoices(), payments()],
        search: SearchBinding {
            collection: "customers".into(),
            template: ListTemplate::new("customer", "customers", "name")
                .column("email", "email")
                .column("plan", "plan")
                .column("status", "status")
                .column("MRR", "mrr"),
            tool: ToolInfo::new(
                "search_customers",
                "Search customers by name, email, account id or plan. \
                 Optionally filter by plan, status or account_owner.",
            ),
        },
        overdue: WindowBinding {
            collection: "invoices".into(),
            date_field: "due_date".into(),
            assignee_field: Some("account_owner".into()),
            template: ListTemplate::new("invoice", "invoices", "customer_name")
                .column("amount", "amount")
                .column("owner", "account_owner")
                .column("status", "status")
                .column("due", "due_date")
                .dated("due_date"),
            tool: ToolInfo::new(
                "get_overdue_invoices",
                "List unpaid invoices past their due date. \
                 Optionally only accounts owned by one account manager.",
            ),
        },
        upcoming: WindowBinding {
            collection: "customers".into(),
            date_field: "renewal_date".into(),
            assignee_field: None,
            template: ListTemplate::new("renewal", "renewals", "name")
                .column("plan", "plan")
                .column("MRR", "mrr")
                .column("owner", "account_owner")
                .column("renews", "renewal_date")
                .dated("renewal_date"),
            tool: ToolInfo::new(
                "get_upcoming_renewals",
                "List customer subscriptions renewing from today through the next N days (default 7).",
            ),
        },
        stats: stats(),
        sample,
    }
}

fn customers() -> Schema {
    Schema::new("customers")
        .required("name", FieldKind::Text)
        .field("email", FieldKind::Text)
        .field("plan", FieldKind::Text)
        .field("status", FieldKind::Text)
        .field("mrr", FieldKind::Money)
        .field("seats", FieldKind::Integer)
        .field("account_owner", FieldKind::Text)
        .field("renewal_date", FieldKind::Date)
        .searchable(&["id", "name", "email", "plan"])
        .filterable(&["plan", "status", "account_owner"])
        .status("status", &["churned"])
}

fn invoices() -> Schema {
    Schema::new("invoices")
        .required("customer_id", FieldKind::Text)
        .field("customer_name", FieldKind::Text)
        .field("amount", FieldKind::Money)
        .field("issued_on", FieldKind::Date)
        .field("due_date", FieldKind::Date)
        .field("status", FieldKind::Text)
        .field("account_owner", FieldKind::Text)
        .filterable(&["status", "customer_id", "account_owner"])
        .status("status", &["paid", "void"])
}

fn payments() -> Schema {
    Schema::new("payments")
        .required("customer_id", FieldKind::Text)
        .field("invoice_id", FieldKind::Text)
        .field("amount", FieldKind::Money)
        .field("status", FieldKind::Text)
        .field("attempted_at", FieldKind::Timestamp)
        .filterable(&["status", "customer_id"])
}

fn stats() -> StatsBinding {
    let outstanding = Predicate::negate(Predicate::one_of("status", &["paid", "void"]));
    StatsBinding {
        template: SummaryTemplate::new("Billing Statistics")
            .groups(
                "MRR by Plan",
                "mrr_by_plan",
                vec![Cell::metric(0, "{} MRR"), Cell::count("{} customer(s)")],
            )
            .groups("Customers by Status", "customers_by_status", vec![Cell::count("{} customer(s)")])
            .totals(
                "Totals",
                vec![
                    TotalLine::new("Total MRR", "total_mrr", Unit::Money),
                    TotalLine::new("Active customers", "active_customers", Unit::Count),
                    TotalLine::new("Failed payments this month", "failed_payments_this_month", Unit::Count),
                    TotalLine::new("Outstanding invoices", "outstanding_invoices", Unit::Count),
                    TotalLine::new("Outstanding balance", "outstanding_balance", Unit::Money),
                ],
            ),
        tables: vec![
            TableBinding {
                collection: "customers".into(),
                filter: Predicate::Always,
                spec: GroupSpec::new("mrr_by_plan", &["plan"]).metric(Metric::Sum {
                    field: "mrr".into(),
                }),
            },
            TableBinding {
                collection: "customers".into(),
                filter: Predicate::Always,
                spec: GroupSpec::new("customers_by_status", &["status"]).metric(Metric::Count),
            },
        ],
        totals: vec![
            TotalBinding {
                collection: "customers".into(),
                spec: ScalarSpec::sum("total_mrr", "mrr", Predicate::Always),
            },
            TotalBinding {
                collection: "customers".into(),
                spec: ScalarSpec::count("active_customers", Predicate::equals("status", "active")),
            },
            TotalBinding {
                collection: "payments".into(),
                spec: ScalarSpec::count(
                    "failed_payments_this_month",
                    Predicate::all(vec![
                        Predicate::equals("status", "failed"),
                        Predicate::same_month("attempted_at"),
                    ]),
                ),
            },
            TotalBinding {
                collection: "invoices".into(),
                spec: ScalarSpec::count("outstanding_invoices", outstanding.clone()),
            },
            TotalBinding {
                collection: "invoices".into(),
                spec: ScalarSpec::sum("outstanding_balance", "amount", outstanding),
            },
        ],
        tool: ToolInfo::new(
            "get_billing_stats",
            "Summarize billing: MRR by plan, customers by status, active customers, \
             failed payments this month and outstanding invoices.",
        ),
    }
}

fn sample(today: NaiveDate) -> Vec<(&'static str, Vec<serde_json::Value>)> {
    let d = |offset| day(today, offset);
    let t = |offset, time| at(today, offset, time);
    vec![
        (
            "customers",
            vec![
                json!({"id": "CUS-1001", "name": "Globex Corporation", "email": "billing@globex.example",
                       "plan": "enterprise", "status": "active", "mrr": "2400.00", "seats": 120,
                       "account_owner": "Jordan Blake", "renewal_date": d(4)}),
                json!({"id": "CUS-1002", "name": "Initech", "email": "ap@initech.example",
                       "plan": "pro", "status": "active", "mrr": "499.00", "seats": 25,
                       "account_owner": "Riley Park", "renewal_date": d(12)}),
                json!({"id": "CUS-1003", "name": "Hooli", "email": "finance@hooli.example",
                       "plan": "pro", "status": "past_due", "mrr": "499.00", "seats": 30,
                       "account_owner": "Jordan Blake", "renewal_date": d(1)}),
                json!({"id": "CUS-1004", "name": "Pied Piper", "email": "richard@piedpiper.example",
                       "plan": "starter", "status": "trialing", "mrr": "49.00", "seats": 5,
                       "account_owner": "Riley Park", "renewal_date": d(7)}),
                json!({"id": "CUS-1005", "name": "Vandelay Industries", "email": "art@vandelay.example",
                       "plan": "starter", "status": "churned", "mrr": "0.00", "seats": 0,
                       "renewal_date": d(-30)}),
                json!({"id": "CUS-1006", "name": "Bluth Company", "email": "gob@bluth.example",
                       "status": "active", "mrr": "149.50", "seats": 8,
                       "account_owner": "Jordan Blake"}),
            ],
        ),
        (
            "invoices",
            vec![
                json!({"id": "INV-5001", "customer_id": "CUS-1003", "customer_name": "Hooli",
                       "amount": "499.00", "issued_on": d(-44), "due_date": d(-14), "status": "open",
                       "account_owner": "Jordan Blake"}),
                json!({"id": "INV-5002", "customer_id": "CUS-1001", "customer_name": "Globex Corporation",
                       "amount": "2400.00", "issued_on": d(-30), "due_date": d(0), "status": "open",
                       "account_owner": "Jordan Blake"}),
                json!({"id": "INV-5003", "customer_id": "CUS-1002", "customer_name": "Initech",
                       "amount": "499.00", "issued_on": d(-40), "due_date": d(-10), "status": "paid",
                       "account_owner": "Riley Park"}),
                json!({"id": "INV-5004", "customer_id": "CUS-1006", "customer_name": "Bluth Company",
                       "amount": "149.50", "issued_on": d(-35), "due_date": d(-5), "status": "open",
                       "account_owner": "Jordan Blake"}),
                json!({"id": "INV-5005", "customer_id": "CUS-1005", "customer_name": "Vandelay Industries",
                       "amount": "49.00", "issued_on": d(-60), "due_date": d(-30), "status": "void"}),
            ],
        ),
        (
            "payments",
            vec![
                json!({"id": "PAY-9001", "customer_id": "CUS-1003", "invoice_id": "INV-5001",
                       "amount": "499.00", "status": "failed", "attempted_at": t(-14, "09:15")}),
                json!({"id": "PAY-9002", "customer_id": "CUS-1002", "invoice_id": "INV-5003",
                       "amount": "499.00", "status": "succeeded", "attempted_at": t(-11, "10:02")}),
                json!({"id": "PAY-9003", "customer_id": "CUS-1006", "invoice_id": "INV-5004",
                       "amount": "149.50", "status": "failed", "attempted_at": t(-5, "08:30")}),
                json!({"id": "PAY-9004", "customer_id": "CUS-1006", "invoice_id": "INV-5004",
                       "amount": "149.50", "status": "failed", "attempted_at": t(-2, "08:30")}),
            ],
        ),
    ]
}
